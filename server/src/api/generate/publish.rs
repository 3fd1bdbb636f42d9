use crate::api::{error_response, ApiMessage};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::orchestrator::{RecipeOutcome, RecipeReport};
use larder_core::GeneratedRecipe;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub recipes: Vec<GeneratedRecipe>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One report per submitted recipe, in order.
    pub reports: Vec<RecipeReport>,
}

/// Status for a batch: success if anything was published, otherwise the
/// first failure decides between 4xx and 5xx.
fn batch_status(reports: &[RecipeReport]) -> StatusCode {
    if reports.iter().any(RecipeReport::is_published) {
        return StatusCode::OK;
    }
    let caller_error = reports.iter().find_map(|report| match &report.outcome {
        RecipeOutcome::Failed { failure } => Some(!failure.retryable),
        RecipeOutcome::Published { .. } => None,
    });
    match caller_error {
        Some(true) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[utoipa::path(
    post,
    path = "/api/generate/publish",
    tag = "generate",
    request_body = PublishRequest,
    responses(
        (status = 200, description = "At least one recipe published; see the reports", body = PublishResponse),
        (status = 400, description = "Nothing publishable", body = PublishResponse),
        (status = 401, description = "Unauthorized", body = ApiMessage),
        (status = 500, description = "Every recipe failed and was rolled back", body = PublishResponse)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn publish_recipes(
    State(state): State<AppState>,
    Json(body): Json<PublishRequest>,
) -> impl IntoResponse {
    if body.recipes.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Select at least one recipe");
    }

    let total = body.recipes.len();
    let reports = state.engine.publish_many(body.recipes).await;
    let published = reports.iter().filter(|r| r.is_published()).count();
    let status = batch_status(&reports);

    let (message, error) = if status == StatusCode::OK {
        (format!("Published {} of {} recipe(s)", published, total), None)
    } else {
        let message = reports
            .iter()
            .find_map(|report| match &report.outcome {
                RecipeOutcome::Failed { failure } => Some(failure.message.clone()),
                RecipeOutcome::Published { .. } => None,
            })
            .unwrap_or_else(|| larder_core::OVERLOADED_MESSAGE.to_string());
        (message, Some("publish_failed".to_string()))
    };

    tracing::info!(published, total, "publish request finished");
    (
        status,
        Json(PublishResponse {
            message,
            error,
            reports,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::PipelineError;

    fn failed(err: PipelineError) -> RecipeReport {
        RecipeReport::new("Soup".to_string(), &Err(err))
    }

    #[test]
    fn all_invalid_is_a_client_error() {
        let reports = vec![failed(PipelineError::invalid_input("recipe has no title"))];
        assert_eq!(batch_status(&reports), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn all_failed_in_the_pipeline_is_a_server_error() {
        let reports = vec![failed(PipelineError::Persistence {
            message: "rolled back".to_string(),
        })];
        assert_eq!(batch_status(&reports), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
