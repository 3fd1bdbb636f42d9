use crate::error::{PipelineError, Stage};
use crate::json_repair::{parse_with_repair, JsonShape};
use crate::llm::LlmProvider;
use crate::prompts::{render_recipe_prompt, RECIPE_PROMPT_NAME};
use crate::types::{GeneratedRecipe, RecipeIdea};

/// Budget for the recipe plus a 700-800 word blog post.
pub const RECIPE_MAX_TOKENS: u32 = 8000;

/// Turn one idea into a complete recipe with blog content.
pub async fn synthesize_recipe(
    provider: &dyn LlmProvider,
    idea: &RecipeIdea,
    max_retries: u32,
) -> Result<GeneratedRecipe, PipelineError> {
    if idea.title.trim().is_empty() {
        return Err(PipelineError::invalid_input("idea title must not be empty"));
    }

    tracing::info!(prompt = RECIPE_PROMPT_NAME, idea = %idea.title, "synthesizing recipe");

    let raw = provider
        .complete(&render_recipe_prompt(idea), RECIPE_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Recipe, e))?;

    let recipe: GeneratedRecipe = parse_with_repair(provider, &raw, JsonShape::Object, max_retries)
        .await
        .map_err(|e| PipelineError::from_repair(Stage::Recipe, e))?;

    let recipe = recipe
        .normalize()
        .map_err(|message| PipelineError::malformed(Stage::Recipe, message))?;

    tracing::info!(
        title = %recipe.title,
        ingredients = recipe.ingredients.len(),
        blog_images = recipe.blog_image_prompts.len(),
        "recipe synthesized"
    );
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;

    fn idea() -> RecipeIdea {
        RecipeIdea {
            title: "Harissa Oats".to_string(),
            description: "Savory porridge".to_string(),
        }
    }

    #[tokio::test]
    async fn parses_and_normalizes() {
        let provider = FakeProvider::with_response(
            "Harissa Oats",
            r#"{"title": " Harissa Oats ", "servings": 0,
                "ingredients": [{"name": "Oats", "quantity": "1", "unit": "cup"}],
                "instructions": ["Cook the oats."]}"#,
        );
        let recipe = synthesize_recipe(&provider, &idea(), 2).await.unwrap();
        assert_eq!(recipe.title, "Harissa Oats");
        assert_eq!(recipe.servings, 1);
    }

    #[tokio::test]
    async fn recipe_without_ingredients_is_malformed() {
        let provider = FakeProvider::with_response(
            "Harissa Oats",
            r#"{"title": "Harissa Oats", "ingredients": [], "instructions": ["Cook."]}"#,
        );
        let err = synthesize_recipe(&provider, &idea(), 2).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
        assert_eq!(err.stage(), Some(Stage::Recipe));
    }

    #[tokio::test]
    async fn blank_idea_is_rejected_up_front() {
        let provider = FakeProvider::new();
        let err = synthesize_recipe(
            &provider,
            &RecipeIdea {
                title: " ".to_string(),
                description: String::new(),
            },
            2,
        )
        .await
        .unwrap_err();
        assert!(err.is_caller_error());
        assert_eq!(provider.call_count(), 0);
    }
}
