pub mod backlogs;
pub mod categories;
pub mod comments;
pub mod generate;
pub mod preview;
pub mod public;
pub mod recipes;
pub mod sessions;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::PipelineError;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::auth::AUTH_COOKIE;

/// Envelope returned by mutating endpoints and by every error.
///
/// `message` is safe to show to people; `error` is a short code that is only
/// present on failures.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}

/// Error code derived from the status line, e.g. "too_many_requests".
fn error_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("error")
        .to_ascii_lowercase()
        .replace(' ', "_")
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiMessage {
            message: message.into(),
            error: Some(error_code(status)),
        }),
    )
        .into_response()
}

pub fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        PipelineError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Respond to a failed pipeline call. Detail stays in the logs; the body
/// carries the user message and the error kind.
pub fn pipeline_error_response(err: &PipelineError) -> Response {
    (
        pipeline_status(err),
        Json(ApiMessage {
            message: err.user_message(),
            error: Some(err.kind().to_string()),
        }),
    )
        .into_response()
}

pub fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "{}", context);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

/// Mark responses to anything but GET/HEAD as uncacheable.
pub async fn no_store(request: Request<Body>, next: Next) -> Response {
    let mutating = !matches!(*request.method(), Method::GET | Method::HEAD);
    let mut response = next.run(request).await;
    if mutating {
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }
    response
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(components(schemas(ApiMessage)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "admin_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        comments::ApiDoc::openapi(),
        categories::ApiDoc::openapi(),
        preview::ApiDoc::openapi(),
        generate::ApiDoc::openapi(),
        sessions::ApiDoc::openapi(),
        backlogs::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_come_from_the_status() {
        assert_eq!(error_code(StatusCode::TOO_MANY_REQUESTS), "too_many_requests");
        assert_eq!(error_code(StatusCode::NOT_FOUND), "not_found");
    }

    #[test]
    fn pipeline_errors_map_to_4xx_and_5xx() {
        assert_eq!(
            pipeline_status(&PipelineError::invalid_input("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            pipeline_status(&PipelineError::Transient {
                stage: larder_core::Stage::Ideas,
                message: "timeout".to_string(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            pipeline_status(&PipelineError::Persistence {
                message: "rolled back".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn every_module_contributes_paths() {
        let spec = openapi();
        for path in [
            "/api/ping",
            "/api/admin/login",
            "/api/recipes/latest",
            "/api/recipes/{id}",
            "/api/comments/{recipe_id}",
            "/api/categories",
            "/api/preview",
            "/api/generate/ideas",
            "/api/sessions/{id}/publish",
            "/api/backlogs/{id}/decision",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
