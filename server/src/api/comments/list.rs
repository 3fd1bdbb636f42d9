use crate::api::{error_response, internal_error, ApiMessage};
use crate::get_conn;
use crate::state::AppState;
use crate::store::{comment_from_row, queries};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use larder_core::Comment;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/comments/{recipe_id}",
    tag = "comments",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = Vec<Comment>),
        (status = 404, description = "Recipe not found", body = ApiMessage)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);

    match queries::recipe_exists(&mut conn, recipe_id) {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch comments", e),
    }

    match queries::list_comments(&mut conn, recipe_id) {
        Ok(rows) => {
            let comments: Vec<Comment> = rows.into_iter().map(comment_from_row).collect();
            (StatusCode::OK, Json(comments)).into_response()
        }
        Err(e) => internal_error("Failed to fetch comments", e),
    }
}
