//! Text completion gateway.
//!
//! A trait-based abstraction over chat model providers. The production
//! provider streams token deltas from an OpenAI-compatible endpoint and
//! concatenates them; the fake provider serves scripted responses to tests.

mod fake;
mod streaming;

pub use fake::FakeProvider;
pub use streaming::{delta_text, map_openai_error, StreamingProvider};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ConfigError, LlmConfig, ProviderKind};

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Completion timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Timeouts, rate limits, network and 5xx failures may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(_)
            | LlmError::RateLimited { .. }
            | LlmError::Timeout { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::ParseError(_) | LlmError::NotConfigured(_) => false,
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations are thread-safe and hold no per-call state. One call is
/// one full completion: the provider gathers the whole streamed response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt and return the complete response text.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "huggingface", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Build the provider selected by `LARDER_LLM_PROVIDER`.
pub fn create_provider_from_env() -> Result<Arc<dyn LlmProvider>, ConfigError> {
    let config = LlmConfig::from_env()?;
    Ok(create_provider(&config))
}

pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match config.provider {
        ProviderKind::Fake => Arc::new(FakeProvider::default()),
        ProviderKind::HuggingFace => Arc::new(StreamingProvider::new(config)),
    }
}
