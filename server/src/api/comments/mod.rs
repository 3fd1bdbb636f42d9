pub mod create;
pub mod list;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/comments endpoints (mounted at /api/comments)
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{recipe_id}",
        get(list::list_comments).post(create::create_comment),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_comments, create::create_comment),
    components(schemas(create::CreateCommentRequest, create::CreateCommentResponse))
)]
pub struct ApiDoc;
