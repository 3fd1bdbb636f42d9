use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Response,
};

use crate::api::error_response;
use crate::state::AppState;

use super::db::session_is_valid;
use super::middleware::{cookie_value, AUTH_COOKIE};

/// Extractor for handlers that mix public and admin methods on one path.
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, AUTH_COOKIE)
            .map(str::to_string)
            .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Missing auth cookie"))?;

        let pool = state.pool.clone();
        let valid = tokio::task::spawn_blocking(move || session_is_valid(&pool, &token))
            .await
            .unwrap_or(false);
        if !valid {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired session",
            ));
        }

        Ok(AdminSession)
    }
}
