//! The anonymous live-preview wizard.
//!
//! A linear walk from a single idea to a published recipe, with every
//! generated artifact editable before the next step. The whole wizard is a
//! plain serializable value so a client can keep it between page loads and
//! send it back with the next action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::report::Failure;
use super::Engine;
use crate::error::PipelineError;
use crate::generate::IdeaRequest;
use crate::types::{GeneratedRecipe, IngredientLine, PublishedSummary, RecipeIdea};

/// The wizard shows one idea at a time.
pub const PREVIEW_IDEA_COUNT: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PreviewStep {
    /// Choosing a direction, cuisines and innovation level.
    #[default]
    Idea,
    /// Reviewing and editing the generated idea.
    EditIdea,
    /// Reviewing and editing the full recipe.
    Recipe,
    Published,
}

/// A change the visitor makes to the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum WizardEdit {
    Request(IdeaRequest),
    Idea(RecipeIdea),
    Ingredients(Vec<IngredientLine>),
    Instructions(Vec<String>),
    ImagePrompt(String),
    BlogImagePrompt { index: usize, prompt: String },
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{action} is not possible at the {step:?} step")]
    WrongStep {
        step: PreviewStep,
        action: &'static str,
    },

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl WizardError {
    pub fn is_caller_error(&self) -> bool {
        match self {
            WizardError::Pipeline(e) => e.is_caller_error(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PreviewWizard {
    #[serde(default)]
    pub step: PreviewStep,
    #[serde(default)]
    pub request: IdeaRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea: Option<RecipeIdea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<GeneratedRecipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedSummary>,
    /// The last failed advance; advancing again retries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

impl PreviewWizard {
    pub fn new(request: IdeaRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a wizard, checking that the saved step has what it needs.
    pub fn from_json(json: &str) -> Result<Self, WizardError> {
        let wizard: Self = serde_json::from_str(json)
            .map_err(|e| WizardError::Invalid(format!("unreadable wizard state: {}", e)))?;
        wizard.check()?;
        Ok(wizard)
    }

    /// Reject a wizard whose step lacks the data that step needs, such as
    /// one sent back by a client.
    pub fn check(&self) -> Result<(), WizardError> {
        let complete = match self.step {
            PreviewStep::Idea => true,
            PreviewStep::EditIdea => self.idea.is_some(),
            PreviewStep::Recipe => self.idea.is_some() && self.recipe.is_some(),
            PreviewStep::Published => self.published.is_some(),
        };
        if !complete {
            return Err(WizardError::Invalid(format!(
                "wizard state at {:?} is missing its data",
                self.step
            )));
        }
        Ok(())
    }

    fn wrong_step(&self, action: &'static str) -> WizardError {
        WizardError::WrongStep {
            step: self.step,
            action,
        }
    }

    fn recipe_mut(&mut self, action: &'static str) -> Result<&mut GeneratedRecipe, WizardError> {
        match (self.step, self.recipe.as_mut()) {
            (PreviewStep::Recipe, Some(recipe)) => Ok(recipe),
            _ => Err(WizardError::WrongStep {
                step: self.step,
                action,
            }),
        }
    }

    /// Apply a visitor edit to the current step.
    pub fn edit(&mut self, edit: WizardEdit) -> Result<(), WizardError> {
        match edit {
            WizardEdit::Request(request) => {
                if self.step != PreviewStep::Idea {
                    return Err(self.wrong_step("editing the request"));
                }
                request.validate()?;
                self.request = request;
            }
            WizardEdit::Idea(idea) => {
                if self.step != PreviewStep::EditIdea {
                    return Err(self.wrong_step("editing the idea"));
                }
                let title = idea.title.trim();
                if title.is_empty() {
                    return Err(WizardError::Invalid("idea title must not be empty".to_string()));
                }
                self.idea = Some(RecipeIdea {
                    title: title.to_string(),
                    description: idea.description.trim().to_string(),
                });
            }
            WizardEdit::Ingredients(ingredients) => {
                if ingredients.iter().all(|i| i.name.trim().is_empty()) {
                    return Err(WizardError::Invalid(
                        "a recipe needs at least one ingredient".to_string(),
                    ));
                }
                self.recipe_mut("editing ingredients")?.ingredients = ingredients;
            }
            WizardEdit::Instructions(instructions) => {
                if instructions.iter().all(|s| s.trim().is_empty()) {
                    return Err(WizardError::Invalid(
                        "a recipe needs at least one instruction".to_string(),
                    ));
                }
                self.recipe_mut("editing instructions")?.instructions = instructions;
            }
            WizardEdit::ImagePrompt(prompt) => {
                self.recipe_mut("editing the image prompt")?.image_prompt = prompt;
            }
            WizardEdit::BlogImagePrompt { index, prompt } => {
                if prompt.trim().is_empty() {
                    return Err(WizardError::Invalid(
                        "Blog image prompt cannot be empty".to_string(),
                    ));
                }
                let recipe = self.recipe_mut("editing a blog image prompt")?;
                let len = recipe.blog_image_prompts.len();
                let slot = recipe.blog_image_prompts.get_mut(index).ok_or_else(|| {
                    WizardError::Invalid(format!(
                        "blog image {} does not exist (have {})",
                        index, len
                    ))
                })?;
                slot.prompt = prompt;
            }
        }
        Ok(())
    }

    /// Run the current step's generation and move to the next step.
    ///
    /// A pipeline failure leaves the step unchanged and records a retryable
    /// error; calling `advance` again retries.
    pub async fn advance(&mut self, engine: &Engine) -> Result<PreviewStep, WizardError> {
        let result = match self.step {
            PreviewStep::Idea => self.generate_idea(engine).await,
            PreviewStep::EditIdea => self.generate_recipe(engine).await,
            PreviewStep::Recipe => self.publish(engine).await,
            PreviewStep::Published => return Err(self.wrong_step("advancing")),
        };

        match result {
            Ok(step) => {
                self.step = step;
                self.error = None;
                Ok(step)
            }
            Err(e) => {
                e.log("preview step failed");
                self.error = Some(Failure::from(&e));
                Err(WizardError::Pipeline(e))
            }
        }
    }

    async fn generate_idea(&mut self, engine: &Engine) -> Result<PreviewStep, PipelineError> {
        let idea = engine
            .ideas(&self.request, PREVIEW_IDEA_COUNT)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PipelineError::malformed(crate::error::Stage::Ideas, "no idea returned")
            })?;
        self.idea = Some(idea);
        Ok(PreviewStep::EditIdea)
    }

    async fn generate_recipe(&mut self, engine: &Engine) -> Result<PreviewStep, PipelineError> {
        let idea = self
            .idea
            .as_ref()
            .ok_or_else(|| PipelineError::invalid_input("no idea to turn into a recipe"))?;
        self.recipe = Some(engine.recipe(idea).await?);
        Ok(PreviewStep::Recipe)
    }

    async fn publish(&mut self, engine: &Engine) -> Result<PreviewStep, PipelineError> {
        let recipe = self
            .recipe
            .clone()
            .ok_or_else(|| PipelineError::invalid_input("no recipe to publish"))?;
        let published = engine.publish(recipe).await?;
        self.published = Some(PublishedSummary::from(&published));
        Ok(PreviewStep::Published)
    }

    /// Step back, discarding what the current step produced.
    pub fn back(&mut self) -> Result<PreviewStep, WizardError> {
        self.step = match self.step {
            PreviewStep::EditIdea => {
                self.idea = None;
                PreviewStep::Idea
            }
            PreviewStep::Recipe => {
                self.recipe = None;
                PreviewStep::EditIdea
            }
            PreviewStep::Idea | PreviewStep::Published => {
                return Err(self.wrong_step("going back"))
            }
        };
        self.error = None;
        Ok(self.step)
    }
}
