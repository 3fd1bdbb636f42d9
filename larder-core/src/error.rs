//! Pipeline-level error taxonomy.
//!
//! Every stage error is folded into a [`PipelineError`] that remembers which
//! [`Stage`] failed. Only this type produces the generic message shown to
//! operators and visitors; the detailed text stays in the logs.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::images::ImageError;
use crate::json_repair::JsonRepairError;
use crate::llm::LlmError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Message returned to callers whenever a provider or pipeline stage fails.
pub const OVERLOADED_MESSAGE: &str = "The server is currently overloaded, please try again later";

/// The stage of the generation pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Directions,
    Ideas,
    Recipe,
    Images,
    Upload,
    Comments,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Directions => "direction suggestions",
            Stage::Ideas => "idea generation",
            Stage::Recipe => "recipe synthesis",
            Stage::Images => "image generation",
            Stage::Upload => "image upload",
            Stage::Comments => "comment generation",
            Stage::Save => "recipe persistence",
        };
        f.write_str(name)
    }
}

/// Error surfaced by the orchestrator and the publish chain.
///
/// The variants carry rendered messages rather than sources so that errors
/// can be stored in step results and backlog reports.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineError {
    /// The provider could not be reached, timed out or rejected the call.
    #[error("{stage} failed talking to the provider: {message}")]
    Transient { stage: Stage, message: String },

    /// The model answered but its JSON stayed invalid after self-repair.
    #[error("{stage} returned malformed output: {message}")]
    MalformedOutput { stage: Stage, message: String },

    /// Object storage rejected an upload.
    #[error("{stage} failed writing to object storage: {message}")]
    Storage { stage: Stage, message: String },

    /// The relational write failed and was rolled back.
    #[error("saving the recipe failed: {message}")]
    Persistence { message: String },

    /// The caller sent something unusable. Raised before any external call.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl PipelineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::MalformedOutput {
            stage,
            message: message.into(),
        }
    }

    pub fn from_llm(stage: Stage, err: LlmError) -> Self {
        PipelineError::Transient {
            stage,
            message: err.to_string(),
        }
    }

    pub fn from_repair(stage: Stage, err: JsonRepairError) -> Self {
        match err {
            JsonRepairError::Llm(e) => Self::from_llm(stage, e),
            other => Self::malformed(stage, other.to_string()),
        }
    }

    pub fn from_image(err: ImageError) -> Self {
        match err {
            ImageError::InvalidImage(message) => Self::malformed(Stage::Images, message),
            other => PipelineError::Transient {
                stage: Stage::Images,
                message: other.to_string(),
            },
        }
    }

    pub fn from_storage(err: StorageError) -> Self {
        PipelineError::Storage {
            stage: Stage::Upload,
            message: err.to_string(),
        }
    }

    pub fn from_store(err: StoreError) -> Self {
        PipelineError::Persistence {
            message: err.to_string(),
        }
    }

    /// The stage that failed, if the error came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Transient { stage, .. }
            | PipelineError::MalformedOutput { stage, .. }
            | PipelineError::Storage { stage, .. } => Some(*stage),
            PipelineError::Persistence { .. } => Some(Stage::Save),
            PipelineError::InvalidInput { .. } => None,
        }
    }

    /// Whether trying the same action again may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::InvalidInput { .. })
    }

    /// Whether the caller is at fault (maps to a 4xx response).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, PipelineError::InvalidInput { .. })
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Transient { .. } => "transient",
            PipelineError::MalformedOutput { .. } => "malformed_output",
            PipelineError::Storage { .. } => "storage",
            PipelineError::Persistence { .. } => "persistence",
            PipelineError::InvalidInput { .. } => "invalid_input",
        }
    }

    /// The message shown to people. Input errors keep their detail, everything
    /// else collapses to the generic overloaded message.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidInput { message } => message.clone(),
            _ => OVERLOADED_MESSAGE.to_string(),
        }
    }

    /// Emit the error at the level and with the fields the logs expect.
    pub fn log(&self, context: &str) {
        match self {
            PipelineError::InvalidInput { .. } => {
                tracing::info!(kind = self.kind(), error = %self, "{}", context)
            }
            PipelineError::MalformedOutput { .. } | PipelineError::Transient { .. } => {
                tracing::warn!(
                    kind = self.kind(),
                    stage = ?self.stage(),
                    error = %self,
                    "{}",
                    context
                )
            }
            _ => tracing::error!(
                kind = self.kind(),
                stage = ?self.stage(),
                error = %self,
                "{}",
                context
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_failures_split_into_transient_and_malformed() {
        let transient = PipelineError::from_repair(
            Stage::Ideas,
            JsonRepairError::Llm(LlmError::Timeout { secs: 60 }),
        );
        assert_eq!(transient.kind(), "transient");
        assert_eq!(transient.stage(), Some(Stage::Ideas));

        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let malformed = PipelineError::from_repair(
            Stage::Recipe,
            JsonRepairError::Invalid {
                attempts: 2,
                source: parse_err,
            },
        );
        assert_eq!(malformed.kind(), "malformed_output");
        assert!(malformed.is_retryable());
    }

    #[test]
    fn user_message_hides_provider_detail() {
        let err = PipelineError::Transient {
            stage: Stage::Images,
            message: "503 from https://internal-host".to_string(),
        };
        assert_eq!(err.user_message(), OVERLOADED_MESSAGE);
        assert!(!err.user_message().contains("internal-host"));
    }

    #[test]
    fn input_errors_are_not_retryable() {
        let err = PipelineError::invalid_input("select at least one idea");
        assert!(!err.is_retryable());
        assert!(err.is_caller_error());
        assert_eq!(err.user_message(), "select at least one idea");
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let err = PipelineError::Persistence {
            message: "duplicate key".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "persistence");
        assert_eq!(json["message"], "duplicate key");
    }
}
