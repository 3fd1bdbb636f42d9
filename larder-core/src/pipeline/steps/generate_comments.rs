//! GenerateComments step - seeds a few reader comments.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::generate::generate_comments;
use crate::llm::LlmProvider;
use crate::pipeline::{PipelineStep, StepContext, StepMetadata, StepResult};

/// Step that asks the model for a handful of comments.
///
/// Non-critical: on failure the recipe is saved without comments.
pub struct GenerateCommentsStep {
    provider: Arc<dyn LlmProvider>,
    json_retries: u32,
}

impl GenerateCommentsStep {
    /// Step name constant.
    pub const NAME: &'static str = "generate_comments";

    pub fn new(provider: Arc<dyn LlmProvider>, json_retries: u32) -> Self {
        Self {
            provider,
            json_retries,
        }
    }
}

#[async_trait]
impl PipelineStep for GenerateCommentsStep {
    fn metadata(&self) -> StepMetadata {
        StepMetadata {
            name: Self::NAME,
            description: "Generate seed comments",
            continues_on_failure: true,
        }
    }

    async fn execute(&self, ctx: &StepContext<'_>) -> StepResult {
        let start = Instant::now();
        let next = Some("save_recipe");

        match generate_comments(self.provider.as_ref(), ctx.recipe, self.json_retries).await {
            Ok(comments) => StepResult::succeeded(
                Self::NAME,
                serde_json::to_value(&comments).unwrap_or_default(),
                start,
                next,
            ),
            Err(e) => StepResult::failed(Self::NAME, e, start, next),
        }
    }
}
