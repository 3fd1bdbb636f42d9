//! Generation triggers for the admin dashboard. Mounted behind
//! [`crate::auth::require_admin`].

pub mod comments;
pub mod directions;
pub mod ideas;
pub mod publish;
pub mod recipes;

use crate::state::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/generate endpoints (mounted at /api/generate)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ideas", post(ideas::generate_ideas))
        .route("/recipes", post(recipes::generate_recipes))
        .route("/publish", post(publish::publish_recipes))
        .route("/comments", post(comments::generate_comments))
        .route("/directions", post(directions::suggest_directions))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        ideas::generate_ideas,
        recipes::generate_recipes,
        publish::publish_recipes,
        comments::generate_comments,
        directions::suggest_directions,
    ),
    components(schemas(
        ideas::IdeasRequest,
        ideas::IdeasResponse,
        recipes::RecipesRequest,
        recipes::RecipesResponse,
        publish::PublishRequest,
        publish::PublishResponse,
        comments::CommentsRequest,
        comments::CommentsResponse,
        directions::DirectionsResponse,
    ))
)]
pub struct ApiDoc;
