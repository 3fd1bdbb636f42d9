//! Orchestration of the generation pipeline.
//!
//! [`Engine`] owns the providers and stores and exposes each stage. The three
//! operating modes are built on top of it:
//!
//! - [`GenerationSession`]: one direction, explicit selection at each step
//! - [`BacklogHandle`]: a FIFO of directions with timed auto-advance
//! - [`PreviewWizard`]: the anonymous single-recipe wizard
//!
//! Publishing one recipe runs the step pipeline with a fresh upload ledger;
//! when a critical step fails the uploaded objects are deleted before the
//! error is returned.

mod backlog;
mod preview;
mod report;
mod session;

pub use backlog::{
    parse_directions, BacklogHandle, BacklogPhase, BacklogStatus, Decision, DecisionError,
};
pub use preview::{PreviewStep, PreviewWizard, WizardEdit, WizardError, PREVIEW_IDEA_COUNT};
pub use report::{DirectionOutcome, DirectionReport, Failure, RecipeOutcome, RecipeReport};
pub use session::{GenerationSession, SessionError, SessionState, SESSION_IDEA_COUNT};

use std::sync::Arc;

use futures_util::{stream, StreamExt};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::generate::{
    comments_for, generate_comments, generate_ideas, suggest_directions, synthesize_recipe,
    IdeaRequest,
};
use crate::images::{ImageGenerator, UploadLedger};
use crate::llm::LlmProvider;
use crate::pipeline::steps::{GenerateCommentsStep, GenerateImagesStep, SaveRecipeStep};
use crate::pipeline::{
    run_pipeline, MemoryOutputStore, StepOutputStore, StepRegistry, PUBLISH_FIRST_STEP,
};
use crate::slug::slugify;
use crate::storage::ObjectStore;
use crate::store::RecipeStore;
use crate::types::{GeneratedRecipe, PublishedRecipe, RecipeIdea, SeedComment};

/// Providers, stores and knobs shared by every orchestration mode.
#[derive(Clone)]
pub struct Engine {
    provider: Arc<dyn LlmProvider>,
    images: Arc<dyn ImageGenerator>,
    objects: Arc<dyn ObjectStore>,
    store: Arc<dyn RecipeStore>,
    config: PipelineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        images: Arc<dyn ImageGenerator>,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn RecipeStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            images,
            objects,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// Generate `count` ideas after validating the request.
    pub async fn ideas(
        &self,
        request: &IdeaRequest,
        count: usize,
    ) -> Result<Vec<RecipeIdea>, PipelineError> {
        request.validate()?;
        generate_ideas(
            self.provider.as_ref(),
            request,
            count,
            self.config.json_retries,
        )
        .await
    }

    pub async fn recipe(&self, idea: &RecipeIdea) -> Result<GeneratedRecipe, PipelineError> {
        synthesize_recipe(self.provider.as_ref(), idea, self.config.json_retries).await
    }

    /// Synthesize every idea in order, stopping at the first failure.
    pub async fn recipes(
        &self,
        ideas: &[RecipeIdea],
    ) -> Result<Vec<GeneratedRecipe>, PipelineError> {
        let mut recipes = Vec::with_capacity(ideas.len());
        for idea in ideas {
            recipes.push(self.recipe(idea).await?);
        }
        Ok(recipes)
    }

    pub async fn comments(
        &self,
        recipe: &GeneratedRecipe,
    ) -> Result<Vec<SeedComment>, PipelineError> {
        generate_comments(self.provider.as_ref(), recipe, self.config.json_retries).await
    }

    /// Comments for an already stored recipe.
    pub async fn comments_for(
        &self,
        title: &str,
        summary: &str,
    ) -> Result<Vec<SeedComment>, PipelineError> {
        comments_for(self.provider.as_ref(), title, summary, self.config.json_retries).await
    }

    pub async fn directions(&self) -> Result<Vec<String>, PipelineError> {
        suggest_directions(self.provider.as_ref(), self.config.json_retries).await
    }

    fn publish_registry(&self, ledger: Arc<UploadLedger>) -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry.register(Box::new(GenerateImagesStep::new(
            self.images.clone(),
            self.objects.clone(),
            ledger,
        )));
        registry.register(Box::new(GenerateCommentsStep::new(
            self.provider.clone(),
            self.config.json_retries,
        )));
        registry.register(Box::new(SaveRecipeStep::new(self.store.clone())));
        registry
    }

    /// Generate images and comments for `recipe` and persist it.
    ///
    /// Either the recipe is stored with all of its images, or nothing is:
    /// objects uploaded during a failed attempt are deleted first.
    pub async fn publish(&self, recipe: GeneratedRecipe) -> Result<PublishedRecipe, PipelineError> {
        let recipe = recipe.normalize().map_err(PipelineError::invalid_input)?;
        let slug = slugify(&recipe.title);
        let ledger = Arc::new(UploadLedger::default());
        let registry = self.publish_registry(ledger.clone());
        let mut outputs = MemoryOutputStore::default();

        tracing::info!(title = %recipe.title, slug = %slug, "publishing recipe");
        let run = run_pipeline(PUBLISH_FIRST_STEP, &recipe, &slug, &mut outputs, &registry).await;

        let outcome = match run.fatal() {
            Some(failed) => Err(failed.error.clone().unwrap_or_else(|| {
                PipelineError::Persistence {
                    message: format!("step {} failed", failed.step_name),
                }
            })),
            None => outputs
                .get_output(SaveRecipeStep::NAME)
                .and_then(|v| serde_json::from_value::<PublishedRecipe>(v).ok())
                .ok_or_else(|| PipelineError::Persistence {
                    message: "pipeline finished without a saved recipe".to_string(),
                }),
        };

        if let Err(e) = &outcome {
            if !ledger.is_empty() {
                ledger.rollback(self.objects.as_ref()).await;
            }
            e.log("publish failed");
        }
        outcome
    }

    /// Publish several recipes, up to `max_parallel_recipes` at a time.
    ///
    /// Reports come back in input order. Each recipe rolls back on its own.
    pub async fn publish_many(&self, recipes: Vec<GeneratedRecipe>) -> Vec<RecipeReport> {
        let parallel = self.config.max_parallel_recipes.max(1);
        stream::iter(recipes)
            .map(|recipe| async move {
                let title = recipe.title.clone();
                let result = self.publish(recipe).await;
                RecipeReport::new(title, &result)
            })
            .buffered(parallel)
            .collect()
            .await
    }
}
