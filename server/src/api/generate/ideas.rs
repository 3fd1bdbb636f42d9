use crate::api::{error_response, pipeline_error_response, ApiMessage};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::{IdeaRequest, RecipeIdea};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_IDEA_COUNT: usize = 3;
pub const MAX_IDEA_COUNT: usize = 10;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IdeasRequest {
    #[serde(flatten)]
    pub request: IdeaRequest,
    /// How many ideas to ask for (1-10, default 3)
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdeasResponse {
    pub message: String,
    pub ideas: Vec<RecipeIdea>,
}

#[utoipa::path(
    post,
    path = "/api/generate/ideas",
    tag = "generate",
    request_body(content = IdeasRequest, example = json!({"direction": "spicy vegan breakfast", "cuisines": ["Mexican"], "innovationLevel": 60, "count": 3})),
    responses(
        (status = 200, description = "Ideas generated", body = IdeasResponse),
        (status = 400, description = "Invalid request", body = ApiMessage),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 503, description = "Provider unavailable", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn generate_ideas(
    State(state): State<AppState>,
    Json(body): Json<IdeasRequest>,
) -> impl IntoResponse {
    let count = body.count.unwrap_or(DEFAULT_IDEA_COUNT);
    if !(1..=MAX_IDEA_COUNT).contains(&count) {
        return error_response(StatusCode::BAD_REQUEST, "count must be between 1 and 10");
    }

    match state.engine.ideas(&body.request, count).await {
        Ok(ideas) => (
            StatusCode::OK,
            Json(IdeasResponse {
                message: format!("Generated {} idea(s)", ideas.len()),
                ideas,
            }),
        )
            .into_response(),
        Err(e) => {
            e.log("idea generation failed");
            pipeline_error_response(&e)
        }
    }
}
