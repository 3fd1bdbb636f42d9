//! SaveRecipe step - writes the recipe, its images and comments in one go.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::images::RecipeImages;
use crate::pipeline::{PipelineStep, StepContext, StepMetadata, StepResult};
use crate::store::{NewPublication, RecipeStore};
use crate::types::SeedComment;

use super::{GenerateCommentsStep, GenerateImagesStep};

/// Terminal step that persists everything produced so far.
pub struct SaveRecipeStep {
    store: Arc<dyn RecipeStore>,
}

impl SaveRecipeStep {
    /// Step name constant.
    pub const NAME: &'static str = "save_recipe";

    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PipelineStep for SaveRecipeStep {
    fn metadata(&self) -> StepMetadata {
        StepMetadata {
            name: Self::NAME,
            description: "Save recipe to storage",
            continues_on_failure: false,
        }
    }

    async fn execute(&self, ctx: &StepContext<'_>) -> StepResult {
        let start = Instant::now();

        let images: RecipeImages = match ctx
            .outputs
            .get_output(GenerateImagesStep::NAME)
            .map(serde_json::from_value)
        {
            Some(Ok(images)) => images,
            Some(Err(e)) => {
                return StepResult::failed(
                    Self::NAME,
                    PipelineError::Persistence {
                        message: format!("unreadable generate_images output: {}", e),
                    },
                    start,
                    None,
                )
            }
            None => {
                return StepResult::failed(
                    Self::NAME,
                    PipelineError::Persistence {
                        message: "generate_images output not found".to_string(),
                    },
                    start,
                    None,
                )
            }
        };

        // Missing or unreadable comments mean the comment step failed.
        let comments: Vec<SeedComment> = ctx
            .outputs
            .get_output(GenerateCommentsStep::NAME)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        let publication = NewPublication {
            recipe: ctx.recipe.clone(),
            main_image_url: images.main_image_url,
            blog_images: images.blog_images,
            comments,
        };

        match self.store.publish(publication).await {
            Ok(recipe) => {
                tracing::info!(
                    id = %recipe.id,
                    slug = %recipe.slug,
                    comments = recipe.comments.len(),
                    "recipe saved"
                );
                StepResult::succeeded(
                    Self::NAME,
                    serde_json::to_value(&recipe).unwrap_or_default(),
                    start,
                    None,
                )
            }
            Err(e) => StepResult::failed(Self::NAME, PipelineError::from_store(e), start, None),
        }
    }
}
