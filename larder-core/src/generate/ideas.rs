use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Stage};
use crate::json_repair::{parse_with_repair, JsonShape};
use crate::llm::LlmProvider;
use crate::prompts::{render_ideas_prompt, InnovationBand, IDEAS_PROMPT_NAME};
use crate::types::RecipeIdea;

pub const IDEAS_MAX_TOKENS: u32 = 800;

/// What the operator (or visitor) asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct IdeaRequest {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    /// 0-100; below 30 is classic, above 70 is adventurous.
    #[serde(default)]
    pub innovation_level: Option<u8>,
}

impl IdeaRequest {
    pub fn for_direction(direction: impl Into<String>) -> Self {
        Self {
            direction: Some(direction.into()),
            ..Self::default()
        }
    }

    /// Reject out-of-range input before any model call.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(level) = self.innovation_level {
            if level > 100 {
                return Err(PipelineError::invalid_input(
                    "innovationLevel must be between 0 and 100",
                ));
            }
        }
        if self.cuisines.iter().any(|c| c.trim().is_empty()) {
            return Err(PipelineError::invalid_input("cuisines must not be blank"));
        }
        Ok(())
    }
}

/// Ask the model for `count` ideas.
///
/// Ideas without a title are discarded; getting none back is a malformed
/// output error.
pub async fn generate_ideas(
    provider: &dyn LlmProvider,
    request: &IdeaRequest,
    count: usize,
    max_retries: u32,
) -> Result<Vec<RecipeIdea>, PipelineError> {
    request.validate()?;
    if count == 0 {
        return Err(PipelineError::invalid_input("ask for at least one idea"));
    }

    let prompt = render_ideas_prompt(
        count,
        request.direction.as_deref(),
        &request.cuisines,
        request.innovation_level.map(InnovationBand::from_level),
    );

    tracing::info!(
        prompt = IDEAS_PROMPT_NAME,
        direction = request.direction.as_deref().unwrap_or(""),
        count,
        "generating recipe ideas"
    );

    let raw = provider
        .complete(&prompt, IDEAS_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Ideas, e))?;

    let ideas: Vec<RecipeIdea> = parse_with_repair(provider, &raw, JsonShape::Array, max_retries)
        .await
        .map_err(|e| PipelineError::from_repair(Stage::Ideas, e))?;

    let ideas: Vec<RecipeIdea> = ideas
        .into_iter()
        .map(|idea| RecipeIdea {
            title: idea.title.trim().to_string(),
            description: idea.description.trim().to_string(),
        })
        .filter(|idea| !idea.title.is_empty())
        .take(count)
        .collect();

    if ideas.is_empty() {
        return Err(PipelineError::malformed(
            Stage::Ideas,
            "model returned no usable ideas",
        ));
    }

    tracing::info!(count = ideas.len(), "recipe ideas generated");
    Ok(ideas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;

    #[tokio::test]
    async fn parses_ideas_from_prose() {
        let provider = FakeProvider::with_response(
            "unique and creative recipe ideas",
            r#"Here are three: [
                {"title": "Chili Tofu Scramble", "description": "Smoky"},
                {"title": "  ", "description": "no title"},
                {"title": "Harissa Oats", "description": "Savory"}
            ]"#,
        );
        let ideas = generate_ideas(
            &provider,
            &IdeaRequest::for_direction("spicy vegan breakfast"),
            3,
            2,
        )
        .await
        .unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].title, "Chili Tofu Scramble");
        assert!(provider.calls()[0].contains("spicy vegan breakfast"));
    }

    #[tokio::test]
    async fn truncates_to_requested_count() {
        let provider = FakeProvider::with_response(
            "recipe idea",
            r#"[{"title": "A"}, {"title": "B"}]"#,
        );
        let ideas = generate_ideas(&provider, &IdeaRequest::default(), 1, 2)
            .await
            .unwrap();
        assert_eq!(ideas.len(), 1);
    }

    #[tokio::test]
    async fn invalid_innovation_level_makes_no_call() {
        let provider = FakeProvider::new();
        let request = IdeaRequest {
            innovation_level: Some(150),
            ..IdeaRequest::default()
        };
        let err = generate_ideas(&provider, &request, 3, 2).await.unwrap_err();
        assert!(err.is_caller_error());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_transient() {
        let provider = FakeProvider::new();
        provider.add_failure("recipe idea", "503");
        let err = generate_ideas(&provider, &IdeaRequest::default(), 3, 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transient");
        assert_eq!(err.stage(), Some(Stage::Ideas));
    }

    #[tokio::test]
    async fn empty_list_is_malformed() {
        let provider = FakeProvider::with_response("recipe idea", "[]");
        let err = generate_ideas(&provider, &IdeaRequest::default(), 3, 2)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
    }
}
