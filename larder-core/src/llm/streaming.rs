//! Streaming chat completion provider for OpenAI-compatible endpoints.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionStreamResponse,
    },
    Client,
};
use async_trait::async_trait;
use futures_util::StreamExt;

use super::{LlmError, LlmProvider};
use crate::config::LlmConfig;

/// Provider that streams `chat/completions` and concatenates the deltas.
#[derive(Debug)]
pub struct StreamingProvider {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl StreamingProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }

    async fn stream_completion(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| {
                LlmError::RequestFailed(format!("Failed to build user message: {}", e))
            })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .max_completion_tokens(max_tokens)
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        tracing::debug!(model = %self.model, max_tokens, "Streaming completion");

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(map_openai_error)?;

        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_openai_error)?;
            if let Some(text) = delta_text(&chunk) {
                content.push_str(text);
            }
        }

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for StreamingProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.stream_completion(prompt, max_tokens)).await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// The text of `choices[0].delta.content`, if the chunk carries any.
pub fn delta_text(chunk: &CreateChatCompletionStreamResponse) -> Option<&str> {
    chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.as_deref())
        .filter(|text| !text.is_empty())
}

/// Map a client error onto [`LlmError`].
///
/// An error object sent inside the stream is reported as an upstream 502, so
/// it stays retryable unless the provider flags it as a rate limit.
pub fn map_openai_error(error: OpenAIError) -> LlmError {
    match error {
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) if status.as_u16() == 429 => LlmError::RateLimited {
                retry_after_secs: None,
            },
            Some(status) => LlmError::ApiError {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => LlmError::RequestFailed(e.to_string()),
        },
        OpenAIError::ApiError(api) => {
            if api.code.as_deref() == Some("rate_limit_exceeded") {
                LlmError::RateLimited {
                    retry_after_secs: None,
                }
            } else {
                LlmError::ApiError {
                    status: 502,
                    message: api.message,
                }
            }
        }
        e @ OpenAIError::JSONDeserialize(..) => LlmError::ParseError(e.to_string()),
        other => LlmError::RequestFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use async_openai::error::ApiError;

    use super::*;

    fn chunk(delta: serde_json::Value) -> CreateChatCompletionStreamResponse {
        serde_json::from_value(serde_json::json!({
            "id": "chunk-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "test-model",
            "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
        }))
        .unwrap()
    }

    fn api_error(code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(
            serde_json::from_value::<ApiError>(serde_json::json!({
                "message": "Model too busy",
                "type": null,
                "param": null,
                "code": code
            }))
            .unwrap(),
        )
    }

    #[test]
    fn extracts_delta_content() {
        assert_eq!(delta_text(&chunk(serde_json::json!({"content": "Hel"}))), Some("Hel"));
    }

    #[test]
    fn role_only_delta_has_no_text() {
        assert_eq!(delta_text(&chunk(serde_json::json!({"role": "assistant"}))), None);
        assert_eq!(delta_text(&chunk(serde_json::json!({"content": ""}))), None);
    }

    #[test]
    fn in_stream_error_is_retryable() {
        let err = map_openai_error(api_error(None));
        match &err {
            LlmError::ApiError { message, .. } => assert_eq!(message, "Model too busy"),
            other => panic!("expected ApiError, got {:?}", other),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn rate_limit_code_maps_to_rate_limited() {
        assert!(matches!(
            map_openai_error(api_error(Some("rate_limit_exceeded"))),
            LlmError::RateLimited { .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_without_panicking() {
        let provider = StreamingProvider::new(&LlmConfig {
            provider: crate::config::ProviderKind::HuggingFace,
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        });
        let result = provider.complete("hello", 10).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_transient());
    }
}
