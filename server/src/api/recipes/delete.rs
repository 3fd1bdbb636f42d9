use crate::api::{error_response, internal_error, ApiMessage};
use crate::auth::AdminSession;
use crate::get_conn;
use crate::state::AppState;
use crate::store::queries;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe and its images deleted", body = ApiMessage),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 404, description = "Recipe not found", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn delete_recipe(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let urls = {
        let mut conn = get_conn!(state.pool);
        match queries::delete_recipe(&mut conn, id) {
            Ok(Some(urls)) => urls,
            Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
            Err(e) => return internal_error("Failed to delete recipe", e),
        }
    };

    // The row is gone; objects that fail to delete are only logged.
    let objects = state.engine.objects();
    for url in &urls {
        let Some(key) = objects.key_for_url(url) else {
            tracing::warn!(recipe_id = %id, url = %url, "image URL is not in our bucket");
            continue;
        };
        if let Err(e) = objects.delete(&key).await {
            tracing::warn!(recipe_id = %id, key = %key, error = %e, "failed to delete image object");
        }
    }

    tracing::info!(recipe_id = %id, images = urls.len(), "recipe deleted");
    (StatusCode::OK, Json(ApiMessage::ok("Recipe deleted"))).into_response()
}
