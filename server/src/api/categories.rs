//! Recipe categories with counts, for navigation.

use crate::api::{internal_error, ApiMessage};
use crate::get_conn;
use crate::state::AppState;
use crate::store::queries;
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use larder_core::slugify;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/categories", get(list_categories))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub slug: String,
    pub recipe_count: i64,
}

impl CategorySummary {
    fn new(name: String, recipe_count: i64) -> Self {
        Self {
            slug: slugify(&name),
            name,
            recipe_count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Categories with recipe counts", body = Vec<CategorySummary>),
        (status = 500, description = "Database error", body = ApiMessage)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    match queries::categories_with_counts(&mut conn) {
        Ok(rows) => {
            let categories: Vec<CategorySummary> = rows
                .into_iter()
                .map(|(name, count)| CategorySummary::new(name, count))
                .collect();
            (StatusCode::OK, Json(categories)).into_response()
        }
        Err(e) => internal_error("Failed to fetch categories", e),
    }
}

#[derive(OpenApi)]
#[openapi(paths(list_categories), components(schemas(CategorySummary)))]
pub struct ApiDoc;
