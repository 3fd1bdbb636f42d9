mod api;
mod auth;
mod db;
mod models;
mod schema;
mod state;
mod store;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use larder_core::config::{ImageConfig, LlmConfig, PipelineConfig, ProviderKind, StorageConfig};
use larder_core::images::{FakeImageGenerator, HfImageGenerator, ImageGenerator};
use larder_core::llm::create_provider;
use larder_core::orchestrator::Engine;
use larder_core::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::state::{AdminCredentials, AppContext, AppState};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wire the engine from the environment. With `LARDER_LLM_PROVIDER=fake`
/// images and storage are local too, so the whole pipeline runs offline.
fn build_engine(pool: db::DbPool) -> anyhow::Result<Engine> {
    let llm = LlmConfig::from_env().context("LLM configuration")?;
    let provider = create_provider(&llm);

    let (images, objects): (Arc<dyn ImageGenerator>, Arc<dyn ObjectStore>) = match llm.provider
    {
        ProviderKind::Fake => {
            tracing::warn!("using fake image generation and in-memory storage");
            (
                Arc::new(FakeImageGenerator::default()),
                Arc::new(MemoryObjectStore::default()),
            )
        }
        ProviderKind::HuggingFace => {
            let image_config = ImageConfig::from_env().context("image configuration")?;
            let storage_config = StorageConfig::from_env().context("storage configuration")?;
            (
                Arc::new(HfImageGenerator::new(&image_config)),
                Arc::new(S3ObjectStore::new(&storage_config)?),
            )
        }
    };

    let config = PipelineConfig::from_env().context("pipeline configuration")?;
    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        bulk_advance_secs = config.bulk_advance.as_secs(),
        max_parallel_recipes = config.max_parallel_recipes,
        "generation engine configured"
    );

    Ok(Engine::new(
        provider,
        images,
        objects,
        Arc::new(store::PgRecipeStore::new(pool)),
        config,
    ))
}

async fn openapi_json() -> impl IntoResponse {
    Json(api::openapi())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        println!("{}", api::openapi().to_pretty_json()?);
        return Ok(());
    }

    dotenvy::dotenv().ok();
    init_telemetry();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = db::create_pool(&database_url)?;
    let engine = build_engine(pool.clone())?;
    let admin = AdminCredentials::from_env()?;

    let state: AppState = Arc::new(AppContext::new(pool, engine, admin));

    // Public routes (no auth required)
    let public_router = Router::new()
        .merge(api::public::router())
        .merge(api::categories::router())
        .merge(api::preview::router())
        .nest("/api/recipes", api::recipes::router())
        .nest("/api/comments", api::comments::router());

    // Admin routes (session cookie required)
    let protected_router = Router::new()
        .nest("/api/generate", api::generate::router())
        .nest("/api/sessions", api::sessions::router())
        .nest("/api/backlogs", api::backlogs::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let app = Router::new()
        .merge(public_router)
        .merge(protected_router)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(middleware::from_fn(api::no_store))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let bind_addr = env::var("LARDER_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("OpenAPI spec available at /api-docs/openapi.json");

    axum::serve(listener, app).await?;
    Ok(())
}
