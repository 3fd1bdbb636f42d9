//! Bulk generation backlogs. Each backlog runs in the background and pauses
//! at every selection point until an operator decides or the timer runs out.

use crate::api::{error_response, ApiMessage};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use larder_core::orchestrator::{
    parse_directions, BacklogHandle, BacklogPhase, BacklogStatus, Decision, DecisionError,
};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/backlogs endpoints (mounted at /api/backlogs)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_backlogs).post(create_backlog))
        .route("/{id}", get(get_backlog).delete(delete_backlog))
        .route("/{id}/decision", post(decide))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBacklogRequest {
    /// One direction per line; blank lines are ignored.
    pub directions: String,
}

fn decision_status(err: &DecisionError) -> StatusCode {
    match err {
        DecisionError::NotWaiting(_) | DecisionError::Closed => StatusCode::CONFLICT,
        DecisionError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
    }
}

#[utoipa::path(
    post,
    path = "/api/backlogs",
    tag = "backlogs",
    request_body = CreateBacklogRequest,
    responses(
        (status = 201, description = "Backlog started", body = BacklogStatus),
        (status = 400, description = "No directions given", body = ApiMessage),
        (status = 401, description = "Unauthorized", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn create_backlog(
    State(state): State<AppState>,
    Json(request): Json<CreateBacklogRequest>,
) -> impl IntoResponse {
    let directions = parse_directions(&request.directions);
    if directions.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Enter at least one direction");
    }

    let count = directions.len();
    let handle = BacklogHandle::spawn(state.engine.clone(), directions);
    let id = handle.id();
    let status = handle.status();
    state.backlogs.insert(id, handle);
    tracing::info!(backlog = %id, directions = count, "backlog started");

    (StatusCode::CREATED, Json(status)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/backlogs",
    tag = "backlogs",
    responses(
        (status = 200, description = "All backlogs, running and drained", body = Vec<BacklogStatus>),
        (status = 401, description = "Unauthorized", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn list_backlogs(State(state): State<AppState>) -> impl IntoResponse {
    let statuses: Vec<BacklogStatus> = state
        .backlogs
        .iter()
        .map(|entry| entry.value().status())
        .collect();
    (StatusCode::OK, Json(statuses)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/backlogs/{id}",
    tag = "backlogs",
    params(
        ("id" = Uuid, Path, description = "Backlog ID")
    ),
    responses(
        (status = 200, description = "Backlog status", body = BacklogStatus),
        (status = 404, description = "Backlog not found", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn get_backlog(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.backlogs.get(&id) {
        Some(handle) => (StatusCode::OK, Json(handle.status())).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Backlog not found"),
    }
}

#[utoipa::path(
    post,
    path = "/api/backlogs/{id}/decision",
    tag = "backlogs",
    params(
        ("id" = Uuid, Path, description = "Backlog ID")
    ),
    request_body = Decision,
    responses(
        (status = 200, description = "Decision accepted", body = BacklogStatus),
        (status = 400, description = "Selection out of range", body = ApiMessage),
        (status = 404, description = "Backlog not found", body = ApiMessage),
        (status = 409, description = "Backlog is not waiting for that decision", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn decide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(decision): Json<Decision>,
) -> impl IntoResponse {
    let Some(handle) = state.backlogs.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Backlog not found");
    };

    match handle.decide(decision) {
        Ok(()) => (StatusCode::OK, Json(handle.status())).into_response(),
        Err(e) => {
            tracing::info!(backlog = %id, error = %e, "decision rejected");
            error_response(decision_status(&e), e.to_string())
        }
    }
}

/// Remove a backlog once it has drained. A running backlog stays put.
fn remove_drained(
    backlogs: &DashMap<Uuid, BacklogHandle>,
    id: Uuid,
) -> Result<BacklogStatus, StatusCode> {
    let removed = backlogs.remove_if(&id, |_, handle| {
        handle.is_finished() || handle.status().phase == BacklogPhase::Drained
    });
    match removed {
        Some((_, handle)) => Ok(handle.status()),
        None if backlogs.contains_key(&id) => Err(StatusCode::CONFLICT),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[utoipa::path(
    delete,
    path = "/api/backlogs/{id}",
    tag = "backlogs",
    params(
        ("id" = Uuid, Path, description = "Backlog ID")
    ),
    responses(
        (status = 200, description = "Backlog removed", body = BacklogStatus),
        (status = 404, description = "Backlog not found", body = ApiMessage),
        (status = 409, description = "Backlog is still running", body = ApiMessage)
    ),
    security(
        ("admin_cookie" = [])
    )
)]
pub async fn delete_backlog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match remove_drained(&state.backlogs, id) {
        Ok(status) => {
            tracing::info!(backlog = %id, "backlog removed");
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(status) if status == StatusCode::CONFLICT => {
            error_response(status, "Backlog is still running")
        }
        Err(status) => error_response(status, "Backlog not found"),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(create_backlog, list_backlogs, get_backlog, decide, delete_backlog),
    components(schemas(CreateBacklogRequest))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::orchestrator::Engine;
    use larder_core::{
        FakeImageGenerator, FakeProvider, MemoryObjectStore, MemoryRecipeStore, PipelineConfig,
    };
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(
            Arc::new(FakeProvider::new().with_default_response("[]")),
            Arc::new(FakeImageGenerator::default()),
            Arc::new(MemoryObjectStore::default()),
            Arc::new(MemoryRecipeStore::default()),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn only_drained_backlogs_are_removed() {
        let backlogs = DashMap::new();

        let running = BacklogHandle::spawn(engine(), vec!["soup".to_string()]);
        let running_id = running.id();
        backlogs.insert(running_id, running);
        assert_eq!(
            remove_drained(&backlogs, running_id).unwrap_err(),
            StatusCode::CONFLICT
        );

        let empty = BacklogHandle::spawn(engine(), Vec::new());
        let empty_id = empty.id();
        backlogs.insert(empty_id, empty);
        loop {
            let done = backlogs
                .get(&empty_id)
                .map(|handle| handle.is_finished())
                .unwrap_or(true);
            if done {
                break;
            }
            tokio::task::yield_now().await;
        }

        let status = remove_drained(&backlogs, empty_id).unwrap();
        assert_eq!(status.phase, BacklogPhase::Drained);
        assert!(!backlogs.contains_key(&empty_id));
        assert!(backlogs.contains_key(&running_id));
        assert_eq!(
            remove_drained(&backlogs, empty_id).unwrap_err(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn decision_errors_map_to_statuses() {
        assert_eq!(
            decision_status(&DecisionError::NotWaiting(BacklogPhase::Publishing)),
            StatusCode::CONFLICT
        );
        assert_eq!(decision_status(&DecisionError::Closed), StatusCode::CONFLICT);
        assert_eq!(
            decision_status(&DecisionError::OutOfRange { index: 4, len: 3 }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn decision_body_is_tagged_by_point() {
        let decision: Decision =
            serde_json::from_str(r#"{"point":"recipes","selection":[0,2]}"#).unwrap();
        assert_eq!(decision, Decision::Recipes(vec![0, 2]));
    }
}
