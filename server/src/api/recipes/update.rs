use crate::api::{error_response, internal_error, ApiMessage};
use crate::auth::AdminSession;
use crate::get_conn;
use crate::models::RecipeChanges;
use crate::state::AppState;
use crate::store::queries;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use larder_core::{slugify, Difficulty};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::RecipeCard;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    /// Changing the title also changes the slug.
    pub title: Option<String>,
    pub description: Option<String>,
    pub cooking_time: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub servings: Option<u32>,
    pub instructions: Option<Vec<String>>,
    pub blog_content: Option<String>,
    pub blog_summary: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateRecipeResponse {
    pub message: String,
    pub recipe: RecipeCard,
}

impl UpdateRecipeRequest {
    fn into_changes(self) -> Result<RecipeChanges, String> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err("title must not be empty".to_string())
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };
        let instructions = match self.instructions {
            Some(steps) => {
                let steps: Vec<String> = steps
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if steps.is_empty() {
                    return Err("instructions must not be empty".to_string());
                }
                Some(steps.join("\n"))
            }
            None => None,
        };
        if self.servings == Some(0) {
            return Err("servings must be at least 1".to_string());
        }

        Ok(RecipeChanges {
            slug: title.as_deref().map(slugify),
            title,
            description: self.description,
            cooking_time: self.cooking_time.map(|t| t.min(i32::MAX as u32) as i32),
            difficulty: self.difficulty.map(|d| d.as_str().to_string()),
            servings: self.servings.map(|s| s.min(i32::MAX as u32) as i32),
            instructions,
            blog_content: self.blog_content,
            blog_summary: self.blog_summary,
            featured: self.featured,
            updated_at: Some(Utc::now()),
        })
    }
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = UpdateRecipeResponse),
        (status = 400, description = "Invalid field value", body = ApiMessage),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 404, description = "Recipe not found", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn update_recipe(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    let changes = match request.into_changes() {
        Ok(c) => c,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let mut conn = get_conn!(state.pool);
    match queries::update_recipe(&mut conn, id, &changes) {
        Ok(Some(row)) => {
            tracing::info!(recipe_id = %id, "recipe updated");
            (
                StatusCode::OK,
                Json(UpdateRecipeResponse {
                    message: "Recipe updated".to_string(),
                    recipe: RecipeCard::from(row),
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => internal_error("Failed to update recipe", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_change_moves_the_slug() {
        let changes = UpdateRecipeRequest {
            title: Some("  Smoky Black Bean Soup ".to_string()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.title.as_deref(), Some("Smoky Black Bean Soup"));
        assert_eq!(changes.slug.as_deref(), Some("smoky-black-bean-soup"));
        assert!(changes.updated_at.is_some());
    }

    #[test]
    fn blank_values_are_rejected() {
        let blank_title = UpdateRecipeRequest {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_title.into_changes().is_err());

        let blank_steps = UpdateRecipeRequest {
            instructions: Some(vec!["".to_string(), "  ".to_string()]),
            ..Default::default()
        };
        assert!(blank_steps.into_changes().is_err());

        let no_servings = UpdateRecipeRequest {
            servings: Some(0),
            ..Default::default()
        };
        assert!(no_servings.into_changes().is_err());
    }

    #[test]
    fn instructions_are_joined_one_per_line() {
        let changes = UpdateRecipeRequest {
            instructions: Some(vec!["Chop.".to_string(), " Fry. ".to_string()]),
            difficulty: Some(Difficulty::Hard),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.instructions.as_deref(), Some("Chop.\nFry."));
        assert_eq!(changes.difficulty.as_deref(), Some("Hard"));
        assert!(changes.slug.is_none());
    }
}
