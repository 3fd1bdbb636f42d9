//! Fake LLM provider for testing.
//!
//! This provider returns deterministic responses based on prompt matching,
//! allowing tests to run without network access or API costs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, LlmProvider};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    /// Replies are consumed front to back; the last one repeats forever.
    replies: VecDeque<Reply>,
}

/// A fake LLM provider for testing.
///
/// Responses are matched by checking whether the prompt contains a registered
/// substring (case-insensitive). Rules are tried in the order they were added.
/// If no rule matches, the default response is returned, or an error when
/// there is none. Every prompt is recorded.
#[derive(Debug)]
pub struct FakeProvider {
    rules: Mutex<Vec<Rule>>,
    default_response: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_response: Some("{}".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    /// Create a new FakeProvider with no registered responses.
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.push_rule(prompt_contains, vec![Reply::Text(response.to_string())]);
    }

    /// Answer successive matching prompts with successive responses.
    pub fn add_sequence(&self, prompt_contains: &str, responses: &[&str]) {
        let replies = responses
            .iter()
            .map(|r| Reply::Text(r.to_string()))
            .collect();
        self.push_rule(prompt_contains, replies);
    }

    /// Fail every prompt containing a specific substring.
    pub fn add_failure(&self, prompt_contains: &str, message: &str) {
        self.push_rule(prompt_contains, vec![Reply::Fail(message.to_string())]);
    }

    fn push_rule(&self, pattern: &str, replies: Vec<Reply>) {
        self.rules
            .lock()
            .unwrap()
            .push(Rule {
                pattern: pattern.to_lowercase(),
                replies: replies.into(),
            });
    }

    /// Every prompt received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of prompts received that contain a substring (case-insensitive).
    pub fn call_count_matching(&self, prompt_contains: &str) -> usize {
        let needle = prompt_contains.to_lowercase();
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.to_lowercase().contains(&needle))
            .count()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let prompt_lower = prompt.to_lowercase();
        let reply = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter_mut()
                .find(|rule| prompt_lower.contains(&rule.pattern))
                .and_then(|rule| {
                    if rule.replies.len() > 1 {
                        rule.replies.pop_front()
                    } else {
                        rule.replies.front().cloned()
                    }
                })
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(LlmError::ApiError {
                status: 503,
                message,
            }),
            None => match &self.default_response {
                Some(response) => Ok(response.clone()),
                None => Err(LlmError::RequestFailed(format!(
                    "FakeProvider: No response configured for prompt (first 100 chars): {}",
                    prompt.chars().take(100).collect::<String>()
                ))),
            },
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
