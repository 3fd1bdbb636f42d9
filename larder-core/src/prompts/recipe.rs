//! Full recipe and blog post prompt.

use crate::types::RecipeIdea;

/// Prompt name for logs.
pub const RECIPE_PROMPT_NAME: &str = "recipe_blog";

/// Render the prompt that turns one idea into a recipe with a blog post.
pub fn render_recipe_prompt(idea: &RecipeIdea) -> String {
    format!(
        r#"Create a detailed, professional-quality recipe in English for "{title}" based on this description: "{description}". The recipe should be suitable for a high-quality food blog. Include precise measurements, clear instructions, and consider dietary variations or substitutions where appropriate.

Also write a blog post about this recipe covering things to know about it, how it was created and the decisions behind it, written for search visibility. Provide 3-5 image prompts for visuals related to the recipe, each with SEO-friendly alt text. Image prompts must describe a photograph and must never ask for text, labels or lettering in the image.

Quantities must be numbers written as strings, for example "1", "0.5" or "2.25".

Format the output as a single JSON object with exactly this structure:
{{
  "title": "Recipe Title",
  "description": "Engaging and appetizing description",
  "cookingTime": 30,
  "difficulty": "Easy|Medium|Hard",
  "servings": 4,
  "ingredients": [
    {{ "name": "Ingredient", "quantity": "1", "unit": "cup" }}
  ],
  "instructions": [
    "Detailed step 1",
    "Detailed step 2"
  ],
  "nutrition": {{
    "calories": 300,
    "protein": 10,
    "carbs": 30,
    "fat": 15
  }},
  "imagePrompt": "Detailed prompt for an appetizing photograph of this recipe",
  "imageAltText": "Descriptive alt text for the recipe image",
  "blogSummary": "Summary of the blog post",
  "blogImagePrompts": [
    {{ "prompt": "Image prompt 1", "altText": "Alt text for image 1" }},
    {{ "prompt": "Image prompt 2", "altText": "Alt text for image 2" }}
  ],
  "blogContent": "A 700-800 word blog post. Use <<IMAGE 1>>, <<IMAGE 2>>, etc. on their own line where each blog image belongs, numbered by position in blogImagePrompts. Start a line with # or ## for a heading. Separate paragraphs with \n and write at least 8 paragraphs."
}}"#,
        title = idea.title,
        description = idea.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_the_idea() {
        let prompt = render_recipe_prompt(&RecipeIdea {
            title: "Chili Tofu Scramble".to_string(),
            description: "Smoky and hot".to_string(),
        });
        assert!(prompt.contains(r#"recipe in English for "Chili Tofu Scramble""#));
        assert!(prompt.contains(r#"description: "Smoky and hot""#));
        assert!(prompt.contains("<<IMAGE 1>>"));
        assert!(prompt.contains(r#""blogImagePrompts""#));
        assert!(prompt.contains("never ask for text"));
    }
}
