use crate::api::{internal_error, ApiMessage};
use crate::get_conn;
use crate::models::RecipeRow;
use crate::state::AppState;
use crate::store::queries::{self, FEATURED_LIMIT, LATEST_LIMIT, RELATED_LIMIT, SEARCH_LIMIT};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::RecipeCard;

const MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct LimitParams {
    /// Number of recipes to return (capped at 50)
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Matched case-insensitively against title and description
    pub q: String,
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn cards(rows: Vec<RecipeRow>) -> Vec<RecipeCard> {
    rows.into_iter().map(RecipeCard::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/recipes/latest",
    tag = "recipes",
    params(LimitParams),
    responses(
        (status = 200, description = "Newest recipes first", body = Vec<RecipeCard>),
        (status = 500, description = "Database error", body = ApiMessage)
    )
)]
pub async fn latest(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    match queries::latest(&mut conn, clamp_limit(params.limit, LATEST_LIMIT)) {
        Ok(rows) => (StatusCode::OK, Json(cards(rows))).into_response(),
        Err(e) => internal_error("Failed to fetch recipes", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/featured",
    tag = "recipes",
    params(LimitParams),
    responses(
        (status = 200, description = "Featured recipes, or the latest when none are featured", body = Vec<RecipeCard>),
        (status = 500, description = "Database error", body = ApiMessage)
    )
)]
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    match queries::featured(&mut conn, clamp_limit(params.limit, FEATURED_LIMIT)) {
        Ok(rows) => (StatusCode::OK, Json(cards(rows))).into_response(),
        Err(e) => internal_error("Failed to fetch recipes", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/search",
    tag = "recipes",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching recipes", body = Vec<RecipeCard>),
        (status = 500, description = "Database error", body = ApiMessage)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    if params.q.trim().is_empty() {
        return (StatusCode::OK, Json(Vec::<RecipeCard>::new())).into_response();
    }
    let mut conn = get_conn!(state.pool);
    match queries::search(&mut conn, &params.q, clamp_limit(params.limit, SEARCH_LIMIT)) {
        Ok(rows) => (StatusCode::OK, Json(cards(rows))).into_response(),
        Err(e) => internal_error("Failed to search recipes", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/related",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        LimitParams
    ),
    responses(
        (status = 200, description = "Recipes sharing a category", body = Vec<RecipeCard>),
        (status = 500, description = "Database error", body = ApiMessage)
    )
)]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(state.pool);
    match queries::related(&mut conn, id, clamp_limit(params.limit, RELATED_LIMIT)) {
        Ok(rows) => (StatusCode::OK, Json(cards(rows))).into_response(),
        Err(e) => internal_error("Failed to fetch related recipes", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(clamp_limit(None, LATEST_LIMIT), 6);
        assert_eq!(clamp_limit(Some(0), LATEST_LIMIT), 1);
        assert_eq!(clamp_limit(Some(500), LATEST_LIMIT), MAX_LIMIT);
    }
}
