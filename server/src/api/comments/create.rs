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
use chrono::{Duration, Utc};
use larder_core::Comment;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Comments one name may leave on one recipe per window.
pub const COMMENTS_PER_WINDOW: i64 = 2;
pub const COMMENT_WINDOW_MINUTES: i64 = 60;

const MAX_USER_CHARS: usize = 50;
const MAX_CONTENT_CHARS: usize = 1000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub user: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateCommentResponse {
    pub message: String,
    pub comment: Comment,
}

impl CreateCommentRequest {
    /// Trimmed `(user, content)` or the reason they are unusable.
    fn validate(&self) -> Result<(&str, &str), &'static str> {
        let user = self.user.trim();
        let content = self.content.trim();
        if user.is_empty() {
            return Err("Name is required");
        }
        if user.chars().count() > MAX_USER_CHARS {
            return Err("Name must be at most 50 characters");
        }
        if content.is_empty() {
            return Err("Comment must not be empty");
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err("Comment must be at most 1000 characters");
        }
        Ok((user, content))
    }
}

#[utoipa::path(
    post,
    path = "/api/comments/{recipe_id}",
    tag = "comments",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment stored", body = CreateCommentResponse),
        (status = 400, description = "Invalid comment", body = ApiMessage),
        (status = 404, description = "Recipe not found", body = ApiMessage),
        (status = 429, description = "Too many comments from this name", body = ApiMessage)
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    let (user, content) = match request.validate() {
        Ok(v) => v,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let mut conn = get_conn!(state.pool);

    match queries::recipe_exists(&mut conn, recipe_id) {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to store comment", e),
    }

    let since = Utc::now() - Duration::minutes(COMMENT_WINDOW_MINUTES);
    match queries::comments_since(&mut conn, recipe_id, user, since) {
        Ok(count) if count >= COMMENTS_PER_WINDOW => {
            tracing::info!(recipe_id = %recipe_id, user, "comment rate limit hit");
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "You can only post 2 comments per hour on this recipe",
            );
        }
        Ok(_) => {}
        Err(e) => return internal_error("Failed to store comment", e),
    }

    match queries::add_comment(&mut conn, recipe_id, user, content) {
        Ok(row) => (
            StatusCode::CREATED,
            Json(CreateCommentResponse {
                message: "Comment added".to_string(),
                comment: comment_from_row(row),
            }),
        )
            .into_response(),
        Err(e) => internal_error("Failed to store comment", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user: &str, content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            user: user.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn trims_before_storing() {
        let req = request("  Maya ", " Lovely! ");
        assert_eq!(req.validate(), Ok(("Maya", "Lovely!")));
    }

    #[test]
    fn rejects_blank_and_oversized_input() {
        assert!(request(" ", "text").validate().is_err());
        assert!(request("Maya", "   ").validate().is_err());
        assert!(request(&"x".repeat(51), "text").validate().is_err());
        assert!(request("Maya", &"x".repeat(1001)).validate().is_err());
        assert!(request("Maya", &"x".repeat(1000)).validate().is_ok());
    }
}
