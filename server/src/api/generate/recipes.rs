use crate::api::{error_response, pipeline_error_response, ApiMessage};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::{GeneratedRecipe, RecipeIdea};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipesRequest {
    pub ideas: Vec<RecipeIdea>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipesResponse {
    pub message: String,
    pub recipes: Vec<GeneratedRecipe>,
}

#[utoipa::path(
    post,
    path = "/api/generate/recipes",
    tag = "generate",
    request_body = RecipesRequest,
    responses(
        (status = 200, description = "One recipe per idea, in order", body = RecipesResponse),
        (status = 400, description = "No ideas given", body = ApiMessage),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 500, description = "Synthesis failed", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn generate_recipes(
    State(state): State<AppState>,
    Json(body): Json<RecipesRequest>,
) -> impl IntoResponse {
    if body.ideas.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Select at least one idea");
    }
    if body.ideas.iter().any(|idea| idea.title.trim().is_empty()) {
        return error_response(StatusCode::BAD_REQUEST, "Every idea needs a title");
    }

    match state.engine.recipes(&body.ideas).await {
        Ok(recipes) => (
            StatusCode::OK,
            Json(RecipesResponse {
                message: format!("Generated {} recipe(s)", recipes.len()),
                recipes,
            }),
        )
            .into_response(),
        Err(e) => {
            e.log("recipe synthesis failed");
            pipeline_error_response(&e)
        }
    }
}
