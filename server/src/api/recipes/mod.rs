pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::models::RecipeRow;
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use larder_core::Difficulty;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/latest", get(list::latest))
        .route("/featured", get(list::featured))
        .route("/search", get(list::search))
        .route("/slug/{slug}", get(get::get_by_slug))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/{id}/related", get(list::related))
}

/// What listings show for a recipe.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCard {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub cooking_time: u32,
    pub difficulty: Difficulty,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl From<RecipeRow> for RecipeCard {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            cooking_time: row.cooking_time.max(0) as u32,
            difficulty: Difficulty::parse_lenient(&row.difficulty),
            featured: row.featured,
            created_at: row.created_at,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::latest,
        list::featured,
        list::search,
        list::related,
        get::get_recipe,
        get::get_by_slug,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        RecipeCard,
        get::RecipeDetail,
        update::UpdateRecipeRequest,
        update::UpdateRecipeResponse,
    ))
)]
pub struct ApiDoc;
