//! Per-recipe and per-direction outcomes recorded by sessions and backlogs.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Stage};
use crate::types::{PublishedRecipe, PublishedSummary};

/// Why something did not get published, safe to show to an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Failure {
    pub stage: Option<Stage>,
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&PipelineError> for Failure {
    fn from(err: &PipelineError) -> Self {
        Self {
            stage: err.stage(),
            kind: err.kind().to_string(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipeOutcome {
    Published { recipe: PublishedSummary },
    Failed { failure: Failure },
}

/// What happened to one recipe of a publish batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeReport {
    pub title: String,
    pub outcome: RecipeOutcome,
}

impl RecipeReport {
    pub fn new(title: String, result: &Result<PublishedRecipe, PipelineError>) -> Self {
        let outcome = match result {
            Ok(recipe) => RecipeOutcome::Published {
                recipe: PublishedSummary::from(recipe),
            },
            Err(e) => RecipeOutcome::Failed {
                failure: Failure::from(e),
            },
        };
        Self { title, outcome }
    }

    pub fn is_published(&self) -> bool {
        matches!(self.outcome, RecipeOutcome::Published { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirectionOutcome {
    /// The direction ran to the end; individual recipes may still have failed.
    Completed { recipes: Vec<RecipeReport> },
    /// Idea generation or recipe synthesis failed and the direction was dropped.
    Failed { failure: Failure },
    /// The operator deselected everything at a decision point.
    Skipped,
}

/// What happened to one backlog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DirectionReport {
    pub direction: String,
    pub outcome: DirectionOutcome,
}

impl DirectionReport {
    pub fn published(&self) -> usize {
        match &self.outcome {
            DirectionOutcome::Completed { recipes } => {
                recipes.iter().filter(|r| r.is_published()).count()
            }
            _ => 0,
        }
    }
}
