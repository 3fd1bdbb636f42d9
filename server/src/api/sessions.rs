//! Interactive single-direction sessions: ideas, then recipes, then publish,
//! with an explicit selection at each step.

use crate::api::{error_response, pipeline_status, ApiMessage};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use larder_core::orchestrator::{GenerationSession, SessionError};
use larder_core::IdeaRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/sessions endpoints (mounted at /api/sessions)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/ideas", post(session_ideas))
        .route("/{id}/recipes", post(session_recipes))
        .route("/{id}/publish", post(session_publish))
        .route("/{id}/back", post(session_back))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session: GenerationSession,
}

/// Indices into the session's current ideas or recipes.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectionRequest {
    pub selection: Vec<usize>,
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::InvalidTransition { .. } => StatusCode::CONFLICT,
        SessionError::EmptySelection | SessionError::SelectionOutOfRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        SessionError::Pipeline(e) => pipeline_status(e),
    }
}

fn respond(session: &GenerationSession, result: Result<String, SessionError>) -> Response {
    match result {
        Ok(message) => (
            StatusCode::OK,
            Json(SessionResponse {
                message,
                error: None,
                session: session.clone(),
            }),
        )
            .into_response(),
        Err(err) => {
            let (message, code) = match &err {
                SessionError::Pipeline(e) => (e.user_message(), e.kind().to_string()),
                other => (other.to_string(), "invalid_request".to_string()),
            };
            (
                session_status(&err),
                Json(SessionResponse {
                    message,
                    error: Some(code),
                    session: session.clone(),
                }),
            )
                .into_response()
        }
    }
}

fn lookup(state: &AppState, id: Uuid) -> Result<Arc<Mutex<GenerationSession>>, Response> {
    state
        .session(id)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Session not found"))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = GenerationSession::new();
    let id = session.id;
    let response = SessionResponse {
        message: "Session created".to_string(),
        error: None,
        session: session.clone(),
    };
    state.sessions.insert(id, Arc::new(Mutex::new(session)));
    tracing::info!(session = %id, "session created");
    (StatusCode::CREATED, Json(response)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Current session state", body = GenerationSession),
        (status = 404, description = "Session not found", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let session = match lookup(&state, id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let session = session.lock().await;
    (StatusCode::OK, Json(session.clone())).into_response()
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session discarded", body = ApiMessage),
        (status = 404, description = "Session not found", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.sessions.remove(&id) {
        Some(_) => (StatusCode::OK, Json(ApiMessage::ok("Session discarded"))).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Session not found"),
    }
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/ideas",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = IdeaRequest,
    responses(
        (status = 200, description = "Ideas ready for selection", body = SessionResponse),
        (status = 400, description = "Invalid request", body = SessionResponse),
        (status = 409, description = "Not possible in the current state", body = SessionResponse),
        (status = 503, description = "Provider unavailable", body = SessionResponse)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn session_ideas(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<IdeaRequest>,
) -> impl IntoResponse {
    let session = match lookup(&state, id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut session = session.lock().await;
    let result = session
        .generate_ideas(&state.engine, request)
        .await
        .map(|ideas| format!("Generated {} idea(s)", ideas.len()));
    respond(&session, result)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/recipes",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Recipes ready for selection", body = SessionResponse),
        (status = 400, description = "Bad selection", body = SessionResponse),
        (status = 409, description = "Not possible in the current state", body = SessionResponse)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn session_recipes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectionRequest>,
) -> impl IntoResponse {
    let session = match lookup(&state, id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut session = session.lock().await;
    let result = session
        .synthesize(&state.engine, &body.selection)
        .await
        .map(|recipes| format!("Generated {} recipe(s)", recipes.len()));
    respond(&session, result)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/publish",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Publish finished; see the session reports", body = SessionResponse),
        (status = 400, description = "Bad selection", body = SessionResponse),
        (status = 409, description = "Not possible in the current state", body = SessionResponse)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn session_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectionRequest>,
) -> impl IntoResponse {
    let session = match lookup(&state, id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut session = session.lock().await;
    let result = session
        .publish(&state.engine, &body.selection)
        .await
        .map(|reports| {
            let published = reports.iter().filter(|r| r.is_published()).count();
            format!("Published {} of {} recipe(s)", published, reports.len())
        });
    respond(&session, result)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/back",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Moved back one step", body = SessionResponse),
        (status = 409, description = "Nothing to go back to", body = SessionResponse)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn session_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let session = match lookup(&state, id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut session = session.lock().await;
    let result = session
        .go_back()
        .map(|state| format!("Back to {:?}", state));
    respond(&session, result)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session,
        get_session,
        delete_session,
        session_ideas,
        session_recipes,
        session_publish,
        session_back,
    ),
    components(schemas(SessionResponse, SelectionRequest))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::orchestrator::SessionState;

    #[test]
    fn session_errors_map_to_statuses() {
        assert_eq!(
            session_status(&SessionError::InvalidTransition {
                state: SessionState::Idle,
                action: "publish",
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            session_status(&SessionError::EmptySelection),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            session_status(&SessionError::Pipeline(
                larder_core::PipelineError::invalid_input("bad level")
            )),
            StatusCode::BAD_REQUEST
        );
    }
}
