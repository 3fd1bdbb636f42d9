use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::api::error_response;
use crate::state::AppState;

use super::db::{session_is_valid, SESSION_TTL_SECS};

pub const AUTH_COOKIE: &str = "auth";

/// `Set-Cookie` value for a freshly issued admin token.
pub fn auth_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
        AUTH_COOKIE, token, SESSION_TTL_SECS
    )
}

/// Value of a named cookie from the `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Middleware that requires a live admin session cookie.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = match cookie_value(request.headers(), AUTH_COOKIE) {
        Some(t) => t.to_string(),
        None => return error_response(StatusCode::UNAUTHORIZED, "Missing auth cookie"),
    };

    let pool = state.pool.clone();
    let valid = tokio::task::spawn_blocking(move || session_is_valid(&pool, &token))
        .await
        .unwrap_or(false);
    if !valid {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    }

    next.run(request).await
}
