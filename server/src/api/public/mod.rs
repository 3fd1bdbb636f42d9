pub mod login;
pub mod ping;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ping", get(ping::ping))
        .route("/api/admin/login", post(login::login))
}

#[derive(OpenApi)]
#[openapi(
    paths(login::login, ping::ping),
    components(schemas(login::LoginRequest, ping::PingResponse))
)]
pub struct ApiDoc;
