//! The anonymous live-preview wizard. The client holds the wizard state and
//! sends it back with each action; nothing is kept server-side until the
//! final step publishes.

use crate::api::{pipeline_status, ApiMessage};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use larder_core::orchestrator::{PreviewWizard, WizardEdit, WizardError};
use larder_core::IdeaRequest;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/preview", post(preview))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewAction {
    /// Begin a new wizard, discarding any state sent along.
    Start {
        #[serde(default)]
        request: IdeaRequest,
    },
    Edit { edit: WizardEdit },
    Advance,
    Back,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PreviewRequest {
    /// State returned by the previous call. Required for everything but `start`.
    #[serde(default)]
    pub wizard: Option<PreviewWizard>,
    pub action: PreviewAction,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub wizard: PreviewWizard,
}

fn wizard_status(err: &WizardError) -> StatusCode {
    match err {
        WizardError::WrongStep { .. } => StatusCode::CONFLICT,
        WizardError::Invalid(_) => StatusCode::BAD_REQUEST,
        WizardError::Pipeline(e) => pipeline_status(e),
    }
}

fn failure(status: StatusCode, message: String, code: &str, wizard: PreviewWizard) -> Response {
    (
        status,
        Json(PreviewResponse {
            message,
            error: Some(code.to_string()),
            wizard,
        }),
    )
        .into_response()
}

async fn apply(
    state: &AppState,
    wizard: &mut PreviewWizard,
    action: PreviewAction,
) -> Result<String, WizardError> {
    match action {
        PreviewAction::Start { .. } => Ok("Wizard started".to_string()),
        PreviewAction::Edit { edit } => {
            wizard.edit(edit)?;
            Ok("Saved".to_string())
        }
        PreviewAction::Advance => {
            let step = wizard.advance(&state.engine).await?;
            Ok(format!("Moved to {:?}", step))
        }
        PreviewAction::Back => {
            let step = wizard.back()?;
            Ok(format!("Back to {:?}", step))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/preview",
    tag = "preview",
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Action applied", body = PreviewResponse),
        (status = 400, description = "Invalid state or edit", body = PreviewResponse),
        (status = 409, description = "Action not possible at this step", body = PreviewResponse),
        (status = 503, description = "Provider unavailable; advancing again retries", body = PreviewResponse)
    )
)]
pub async fn preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> impl IntoResponse {
    let mut wizard = match (&request.action, request.wizard) {
        (PreviewAction::Start { request }, _) => {
            if let Err(e) = request.validate() {
                return failure(
                    StatusCode::BAD_REQUEST,
                    e.user_message(),
                    "invalid_request",
                    PreviewWizard::default(),
                );
            }
            PreviewWizard::new(request.clone())
        }
        (_, Some(wizard)) => wizard,
        (_, None) => {
            return failure(
                StatusCode::BAD_REQUEST,
                "Start the wizard first".to_string(),
                "invalid_request",
                PreviewWizard::default(),
            )
        }
    };

    if let Err(e) = wizard.check() {
        return failure(wizard_status(&e), e.to_string(), "invalid_request", wizard);
    }

    match apply(&state, &mut wizard, request.action).await {
        Ok(message) => (
            StatusCode::OK,
            Json(PreviewResponse {
                message,
                error: None,
                wizard,
            }),
        )
            .into_response(),
        Err(WizardError::Pipeline(e)) => {
            let status = pipeline_status(&e);
            failure(status, e.user_message(), e.kind(), wizard)
        }
        Err(e) => failure(wizard_status(&e), e.to_string(), "invalid_request", wizard),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(preview),
    components(schemas(PreviewRequest, PreviewAction, PreviewResponse, ApiMessage))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::orchestrator::PreviewStep;

    #[test]
    fn actions_are_tagged_by_type() {
        let body: PreviewRequest = serde_json::from_str(r#"{"action":{"type":"advance"}}"#).unwrap();
        assert!(matches!(body.action, PreviewAction::Advance));
        assert!(body.wizard.is_none());

        let body: PreviewRequest = serde_json::from_str(
            r#"{"wizard":{"step":"recipe"},"action":{"type":"edit","edit":{"field":"image_prompt","value":"a bowl"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            body.action,
            PreviewAction::Edit { edit: WizardEdit::ImagePrompt(ref p) } if p == "a bowl"
        ));
        assert_eq!(body.wizard.unwrap().step, PreviewStep::Recipe);
    }

    #[test]
    fn wizard_errors_map_to_statuses() {
        assert_eq!(
            wizard_status(&WizardError::WrongStep {
                step: PreviewStep::Idea,
                action: "going back",
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            wizard_status(&WizardError::Invalid("missing".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
