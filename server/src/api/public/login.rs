use crate::api::{error_response, internal_error, ApiMessage};
use crate::auth::{auth_cookie, create_session, verify_password};
use crate::get_conn;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"username": "admin", "password": "password"})),
    responses(
        (status = 200, description = "Logged in; the auth cookie is set", body = ApiMessage),
        (status = 401, description = "Invalid credentials", body = ApiMessage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let username_matches = req.username.trim() == state.admin.username;
    // Verified even when the username is wrong.
    let password_matches = verify_password(&req.password, &state.admin.password_hash);
    if !(username_matches && password_matches) {
        tracing::info!(username = %req.username, "admin login rejected");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let mut conn = get_conn!(state.pool);
    let token = match create_session(&mut conn) {
        Ok(t) => t,
        Err(e) => return internal_error("Failed to create session", e),
    };

    tracing::info!("admin logged in");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, auth_cookie(&token))],
        Json(ApiMessage::ok("Logged in")),
    )
        .into_response()
}
