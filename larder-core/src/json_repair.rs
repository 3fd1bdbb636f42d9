//! JSON extraction and model-assisted self-repair.
//!
//! Models wrap JSON in prose and occasionally emit broken syntax. The
//! candidate text is sliced out of the response and parsed; on failure the
//! model is asked to rewrite it, a bounded number of times.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::llm::{LlmError, LlmProvider};
use crate::prompts::{render_repair_prompt, REPAIR_PROMPT_NAME};

/// Repair calls allowed per parse unless the caller says otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Token budget for a repair call: the whole document is rewritten.
pub const REPAIR_MAX_TOKENS: u32 = 7000;

#[derive(Debug, Error)]
pub enum JsonRepairError {
    #[error("JSON still invalid after {attempts} repair attempt(s): {source}")]
    Invalid {
        attempts: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("repair request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("JSON did not have the expected shape: {0}")]
    Shape(serde_json::Error),
}

/// The top-level JSON value a call site expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }
}

/// Slice from the first opening delimiter to the last closing one.
///
/// Returns an empty string when either delimiter is missing.
pub fn extract_json_slice(raw: &str, shape: JsonShape) -> &str {
    let (open, close) = shape.delimiters();
    match (raw.find(open), raw.rfind(close)) {
        (Some(start), Some(end)) if end >= start => &raw[start..=end],
        _ => "",
    }
}

/// Byte offset of a parse error within `text`, derived from the error's
/// line and column.
pub fn error_position(text: &str, err: &serde_json::Error) -> Option<usize> {
    let line = err.line();
    if line == 0 {
        return None;
    }

    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let offset = line_start + err.column().saturating_sub(1);
    Some(offset.min(text.len()))
}

/// Extract and parse JSON from a model response, repairing it if needed.
///
/// At most `max_retries` repair calls are made. When they are exhausted the
/// last parse error is returned.
pub async fn extract_and_parse(
    provider: &dyn LlmProvider,
    raw: &str,
    shape: JsonShape,
    max_retries: u32,
) -> Result<Value, JsonRepairError> {
    let mut candidate = extract_json_slice(raw, shape).to_string();
    let mut attempts = 0;

    loop {
        let err = match serde_json::from_str::<Value>(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempts >= max_retries {
            return Err(JsonRepairError::Invalid {
                attempts,
                source: err,
            });
        }
        attempts += 1;

        let position = error_position(&candidate, &err);
        tracing::warn!(
            kind = "malformed_output",
            prompt = REPAIR_PROMPT_NAME,
            attempt = attempts,
            position = ?position,
            error = %err,
            "model returned invalid JSON, requesting a rewrite"
        );

        let prompt = render_repair_prompt(&candidate, position);
        let fixed = provider.complete(&prompt, REPAIR_MAX_TOKENS).await?;
        candidate = extract_json_slice(&fixed, shape).to_string();
    }
}

/// [`extract_and_parse`] followed by conversion into `T`.
pub async fn parse_with_repair<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    raw: &str,
    shape: JsonShape,
    max_retries: u32,
) -> Result<T, JsonRepairError> {
    let value = extract_and_parse(provider, raw, shape, max_retries).await?;
    serde_json::from_value(value).map_err(JsonRepairError::Shape)
}
