use crate::api::{error_response, internal_error, ApiMessage};
use crate::get_conn;
use crate::state::AppState;
use crate::store::{hydrate, queries};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::PgConnection;
use larder_core::{render_blog, BlogBlock, PublishedRecipe};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::RecipeRow;

/// A stored recipe plus its blog post split into blocks.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: PublishedRecipe,
    pub blocks: Vec<BlogBlock>,
}

impl From<PublishedRecipe> for RecipeDetail {
    fn from(recipe: PublishedRecipe) -> Self {
        let blocks = render_blog(&recipe.blog_content, &recipe.blog_images);
        Self { recipe, blocks }
    }
}

fn detail_response(
    conn: &mut PgConnection,
    row: diesel::QueryResult<Option<RecipeRow>>,
) -> Response {
    let row = match row {
        Ok(Some(row)) => row,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch recipe", e),
    };
    match hydrate(conn, row) {
        Ok(recipe) => (StatusCode::OK, Json(RecipeDetail::from(recipe))).into_response(),
        Err(e) => internal_error("Failed to fetch recipe", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetail),
        (status = 404, description = "Recipe not found", body = ApiMessage)
    )
)]
pub async fn get_recipe(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    let row = queries::by_id(&mut conn, id);
    detail_response(&mut conn, row)
}

#[utoipa::path(
    get,
    path = "/api/recipes/slug/{slug}",
    tag = "recipes",
    params(
        ("slug" = String, Path, description = "Recipe slug; the newest match wins")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetail),
        (status = 404, description = "Recipe not found", body = ApiMessage)
    )
)]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    let row = queries::by_slug(&mut conn, &slug);
    detail_response(&mut conn, row)
}
