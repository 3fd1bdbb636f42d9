use crate::api::{pipeline_error_response, ApiMessage};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DirectionsResponse {
    pub message: String,
    /// Short creative directions, one per backlog line
    pub directions: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/generate/directions",
    tag = "generate",
    responses(
        (status = 200, description = "Suggested directions", body = DirectionsResponse),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 503, description = "Provider unavailable", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn suggest_directions(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.directions().await {
        Ok(directions) => (
            StatusCode::OK,
            Json(DirectionsResponse {
                message: format!("Suggested {} direction(s)", directions.len()),
                directions,
            }),
        )
            .into_response(),
        Err(e) => {
            e.log("direction suggestions failed");
            pipeline_error_response(&e)
        }
    }
}
