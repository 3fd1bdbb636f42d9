//! Configuration from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default OpenAI-compatible chat endpoint (Hugging Face router).
pub const DEFAULT_LLM_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/Llama-3.1-70B-Instruct";

/// Default image model endpoint.
pub const DEFAULT_IMAGE_URL: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev";

pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BULK_ADVANCE_SECS: u64 = 8;
pub const DEFAULT_STORAGE_REGION: &str = "us-east-1";

/// Upper bound on concurrently published recipes.
pub const MAX_PARALLEL_RECIPES_CAP: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Which completion backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    HuggingFace,
    Fake,
}

/// Text completion settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// Bearer token. Empty for the fake provider.
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// Required (unless `LARDER_LLM_PROVIDER=fake`):
    /// - `HUGGINGFACE_API_KEY`
    ///
    /// Optional:
    /// - `LARDER_LLM_PROVIDER`: "huggingface" (default) or "fake"
    /// - `LARDER_LLM_BASE_URL`, `LARDER_LLM_MODEL`
    /// - `LARDER_LLM_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match env::var("LARDER_LLM_PROVIDER").as_deref() {
            Ok("fake") => ProviderKind::Fake,
            Ok("huggingface") | Err(_) => ProviderKind::HuggingFace,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LARDER_LLM_PROVIDER".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let api_key = match provider {
            ProviderKind::HuggingFace => required("HUGGINGFACE_API_KEY")?,
            ProviderKind::Fake => env::var("HUGGINGFACE_API_KEY").unwrap_or_default(),
        };

        Ok(Self {
            provider,
            api_key,
            base_url: env::var("LARDER_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            model: env::var("LARDER_LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            timeout: Duration::from_secs(optional_u64(
                "LARDER_LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Image model settings.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub api_key: String,
    pub url: String,
    pub timeout: Duration,
}

impl ImageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required("HUGGINGFACE_API_KEY")?,
            url: env::var("LARDER_IMAGE_URL").unwrap_or_else(|_| DEFAULT_IMAGE_URL.to_string()),
            timeout: Duration::from_secs(optional_u64(
                "LARDER_IMAGE_TIMEOUT_SECS",
                DEFAULT_IMAGE_TIMEOUT_SECS,
            )?),
        })
    }
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Endpoint such as `https://s3.us-east-1.backblazeb2.com`.
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl StorageConfig {
    /// Required: `B2_ENDPOINT`, `B2_BUCKET_NAME`, `B2_ACCESS_KEY_ID`,
    /// `B2_SECRET_ACCESS_KEY`. Optional: `B2_REGION` (default: us-east-1).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: required("B2_ENDPOINT")?,
            bucket: required("B2_BUCKET_NAME")?,
            access_key_id: required("B2_ACCESS_KEY_ID")?,
            secret_access_key: required("B2_SECRET_ACCESS_KEY")?,
            region: env::var("B2_REGION").unwrap_or_else(|_| DEFAULT_STORAGE_REGION.to_string()),
        })
    }
}

/// Orchestration knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How long bulk mode waits at a decision point before selecting everything.
    pub bulk_advance: Duration,
    /// Recipes published concurrently within one selection (1 = sequential).
    pub max_parallel_recipes: usize,
    /// Repair calls allowed per JSON parse.
    pub json_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bulk_advance: Duration::from_secs(DEFAULT_BULK_ADVANCE_SECS),
            max_parallel_recipes: 1,
            json_retries: crate::json_repair::DEFAULT_MAX_RETRIES,
        }
    }
}

impl PipelineConfig {
    /// Optional: `LARDER_BULK_ADVANCE_SECS` (default: 8),
    /// `LARDER_MAX_PARALLEL_RECIPES` (default: 1, capped at 3).
    pub fn from_env() -> Result<Self, ConfigError> {
        let bulk_advance = Duration::from_secs(optional_u64(
            "LARDER_BULK_ADVANCE_SECS",
            DEFAULT_BULK_ADVANCE_SECS,
        )?);
        let max_parallel = optional_u64("LARDER_MAX_PARALLEL_RECIPES", 1)? as usize;

        Ok(Self {
            bulk_advance,
            max_parallel_recipes: max_parallel.clamp(1, MAX_PARALLEL_RECIPES_CAP),
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.bulk_advance, Duration::from_secs(8));
        assert_eq!(config.max_parallel_recipes, 1);
        assert_eq!(config.json_retries, 2);
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let err = required("LARDER_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: LARDER_TEST_SURELY_UNSET_VARIABLE"
        );
    }
}
