//! GenerateImages step - synthesizes and uploads the recipe's images.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::images::{jobs_for, synthesize_and_store, ImageGenerator, RecipeImages, UploadLedger};
use crate::pipeline::{PipelineStep, StepContext, StepMetadata, StepResult};
use crate::storage::ObjectStore;

/// Step that generates the main and blog images and uploads them.
///
/// Every uploaded key lands in the shared ledger so the caller can roll the
/// uploads back if a later step fails.
pub struct GenerateImagesStep {
    generator: Arc<dyn ImageGenerator>,
    objects: Arc<dyn ObjectStore>,
    ledger: Arc<UploadLedger>,
}

impl GenerateImagesStep {
    /// Step name constant.
    pub const NAME: &'static str = "generate_images";

    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        objects: Arc<dyn ObjectStore>,
        ledger: Arc<UploadLedger>,
    ) -> Self {
        Self {
            generator,
            objects,
            ledger,
        }
    }
}

#[async_trait]
impl PipelineStep for GenerateImagesStep {
    fn metadata(&self) -> StepMetadata {
        StepMetadata {
            name: Self::NAME,
            description: "Generate and upload recipe images",
            continues_on_failure: false,
        }
    }

    async fn execute(&self, ctx: &StepContext<'_>) -> StepResult {
        let start = Instant::now();
        let jobs = jobs_for(ctx.recipe);

        let stored = match synthesize_and_store(
            self.generator.as_ref(),
            self.objects.as_ref(),
            ctx.slug,
            &jobs,
            &self.ledger,
        )
        .await
        {
            Ok(stored) => stored,
            Err(e) => return StepResult::failed(Self::NAME, e, start, None),
        };

        match serde_json::to_value(RecipeImages::from_stored(&stored)) {
            Ok(output) => {
                StepResult::succeeded(Self::NAME, output, start, Some("generate_comments"))
            }
            Err(e) => StepResult::failed(
                Self::NAME,
                PipelineError::Persistence {
                    message: format!("could not record image urls: {}", e),
                },
                start,
                None,
            ),
        }
    }
}
