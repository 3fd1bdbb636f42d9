use crate::api::{error_response, internal_error, pipeline_error_response, ApiMessage};
use crate::get_conn;
use crate::state::AppState;
use crate::store::queries;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CommentsRequest {
    /// Slug of a published recipe
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentsResponse {
    pub message: String,
    pub count: usize,
}

#[utoipa::path(
    post,
    path = "/api/generate/comments",
    tag = "generate",
    request_body = CommentsRequest,
    responses(
        (status = 200, description = "Comments generated and stored", body = CommentsResponse),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 404, description = "Recipe not found", body = ApiMessage),
        (status = 503, description = "Provider unavailable", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn generate_comments(
    State(state): State<AppState>,
    Json(body): Json<CommentsRequest>,
) -> impl IntoResponse {
    let recipe = {
        let mut conn = get_conn!(state.pool);
        match queries::by_slug(&mut conn, body.slug.trim()) {
            Ok(Some(row)) => row,
            Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
            Err(e) => return internal_error("Failed to fetch recipe", e),
        }
    };

    let seeded = match state
        .engine
        .comments_for(&recipe.title, &recipe.blog_summary)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            e.log("comment generation failed");
            return pipeline_error_response(&e);
        }
    };

    let mut conn = get_conn!(state.pool);
    match queries::add_seed_comments(&mut conn, recipe.id, &seeded) {
        Ok(count) => {
            tracing::info!(recipe_id = %recipe.id, count, "stored generated comments");
            (
                StatusCode::OK,
                Json(CommentsResponse {
                    message: format!("Added {} comment(s)", count),
                    count,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error("Failed to store comments", e),
    }
}
