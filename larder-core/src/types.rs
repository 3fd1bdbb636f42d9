//! Shared data types for generated and published recipes.
//!
//! The generation types use camelCase on the wire because that is the shape
//! the model is asked to produce. Deserialization is lenient about numbers
//! arriving as strings and about nulls, since model output drifts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A recipe concept produced by the idea generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeIdea {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Case-insensitive parse. Anything unrecognised is treated as Medium.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "beginner" | "simple" => Difficulty::Easy,
            "hard" | "difficult" | "advanced" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::text(deserializer)?;
        Ok(Difficulty::parse_lenient(&raw))
    }
}

/// One ingredient line as the model writes it. `quantity` stays textual
/// until the persistence boundary coerces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngredientLine {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub quantity: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Nutrition {
    #[serde(default, deserialize_with = "lenient::number")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BlogImagePrompt {
    #[serde(deserialize_with = "lenient::text")]
    pub prompt: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub alt_text: String,
}

/// A stored blog image, owned by its recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BlogImage {
    pub image_url: String,
    pub alt_text: String,
}

/// A complete recipe plus blog post, before anything is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient::whole")]
    pub cooking_time: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "one", deserialize_with = "lenient::whole")]
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_prompt: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_alt_text: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub blog_content: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub blog_summary: String,
    #[serde(default)]
    pub blog_image_prompts: Vec<BlogImagePrompt>,
}

fn one() -> u32 {
    1
}

impl GeneratedRecipe {
    /// Tidy model output and reject recipes that cannot be published.
    ///
    /// Blank ingredient names and blank steps are dropped, servings are
    /// raised to at least one. A recipe without a title, ingredients or
    /// instructions is an error.
    pub fn normalize(mut self) -> Result<Self, String> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err("recipe has no title".to_string());
        }

        self.ingredients.retain(|line| !line.name.trim().is_empty());
        for line in &mut self.ingredients {
            line.name = line.name.trim().to_string();
            line.unit = line.unit.trim().to_string();
        }
        if self.ingredients.is_empty() {
            return Err(format!("recipe '{}' has no ingredients", self.title));
        }

        self.instructions = self
            .instructions
            .into_iter()
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty())
            .collect();
        if self.instructions.is_empty() {
            return Err(format!("recipe '{}' has no instructions", self.title));
        }

        self.servings = self.servings.max(1);
        // `<<IMAGE n>>` is positional, so blank prompts are filled, never removed.
        for (i, image) in self.blog_image_prompts.iter_mut().enumerate() {
            image.prompt = image.prompt.trim().to_string();
            if image.prompt.is_empty() {
                image.prompt = if image.alt_text.trim().is_empty() {
                    format!("{}, detail {}", self.title, i + 1)
                } else {
                    format!("{}: {}", self.title, image.alt_text.trim())
                };
            }
        }

        Ok(self)
    }

    /// The prompt used for the main image, falling back to the title.
    pub fn main_image_prompt(&self) -> String {
        if self.image_prompt.trim().is_empty() {
            format!("A professional food photograph of {}", self.title)
        } else {
            self.image_prompt.clone()
        }
    }
}

/// A synthetic reader comment ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SeedComment {
    pub user: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Shared catalog entry, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ingredient {
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeIngredient {
    pub quantity: f64,
    pub ingredient: Ingredient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A recipe as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublishedRecipe {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub cooking_time: u32,
    pub difficulty: Difficulty,
    pub servings: u32,
    pub image_url: String,
    pub instructions: Vec<String>,
    pub nutrition: Nutrition,
    pub blog_content: String,
    pub blog_summary: String,
    pub blog_images: Vec<BlogImage>,
    pub ingredients: Vec<RecipeIngredient>,
    pub comments: Vec<Comment>,
    pub categories: Vec<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enough of a published recipe to link to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublishedSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

impl From<&PublishedRecipe> for PublishedSummary {
    fn from(recipe: &PublishedRecipe) -> Self {
        Self {
            id: recipe.id,
            slug: recipe.slug.clone(),
            title: recipe.title.clone(),
        }
    }
}

/// Deserializers that accept the loose shapes models produce.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// A string, number or bool rendered as text. Null becomes empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        })
    }

    /// A float from a number or from the leading number in a string ("10g").
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => leading_number(&s).unwrap_or_default(),
            _ => 0.0,
        })
    }

    /// A non-negative integer from a number or a string ("30 minutes").
    pub fn whole<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => leading_number(&s).unwrap_or_default(),
            _ => 0.0,
        };
        Ok(if value.is_finite() && value > 0.0 {
            value.round() as u32
        } else {
            0
        })
    }

    pub(crate) fn leading_number(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        trimmed[..end].parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_RECIPE: &str = r##"{
        "title": "Smoky Tofu Scramble",
        "description": "A spicy vegan breakfast",
        "cookingTime": "20 minutes",
        "difficulty": "easy",
        "servings": 2,
        "ingredients": [
            { "name": "Firm tofu", "quantity": 400, "unit": "g" },
            { "name": "Smoked paprika", "quantity": "1", "unit": null }
        ],
        "instructions": ["Crumble the tofu.", "Fry with paprika."],
        "nutrition": { "calories": "320", "protein": "18g", "carbs": 12, "fat": 9.5 },
        "imagePrompt": "Tofu scramble in a cast iron pan",
        "imageAltText": "Tofu scramble",
        "blogContent": "# Why tofu\nIt is great.\n<<IMAGE 1>>",
        "blogSummary": "All about tofu",
        "blogImagePrompts": [{ "prompt": "Tofu block", "altText": "A block of tofu" }]
    }"##;

    #[test]
    fn parses_loose_model_output() {
        let recipe: GeneratedRecipe = serde_json::from_str(MODEL_RECIPE).unwrap();
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert_eq!(recipe.ingredients[0].quantity, "400");
        assert_eq!(recipe.ingredients[1].unit, "");
        assert_eq!(recipe.nutrition.calories, 320.0);
        assert_eq!(recipe.nutrition.protein, 18.0);
        assert_eq!(recipe.blog_image_prompts[0].alt_text, "A block of tofu");
    }

    #[test]
    fn missing_blog_fields_default_to_empty() {
        let recipe: GeneratedRecipe = serde_json::from_str(
            r#"{"title": "Toast", "ingredients": [{"name": "Bread"}], "instructions": ["Toast it"]}"#,
        )
        .unwrap();
        assert_eq!(recipe.servings, 1);
        assert!(recipe.blog_content.is_empty());
        assert!(recipe.blog_image_prompts.is_empty());
        assert_eq!(recipe.difficulty, Difficulty::Medium);
    }

    #[test]
    fn normalize_drops_blank_lines_and_raises_servings() {
        let mut recipe: GeneratedRecipe = serde_json::from_str(MODEL_RECIPE).unwrap();
        recipe.servings = 0;
        recipe.ingredients.push(IngredientLine {
            name: "   ".to_string(),
            quantity: "1".to_string(),
            unit: "cup".to_string(),
        });
        recipe.instructions.push(String::new());

        let recipe = recipe.normalize().unwrap();
        assert_eq!(recipe.servings, 1);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.instructions.len(), 2);
    }

    #[test]
    fn normalize_fills_blank_blog_prompts_in_place() {
        let mut recipe: GeneratedRecipe = serde_json::from_str(MODEL_RECIPE).unwrap();
        recipe.blog_image_prompts.push(BlogImagePrompt {
            prompt: "  ".to_string(),
            alt_text: "Sliced tofu".to_string(),
        });
        recipe.blog_image_prompts.push(BlogImagePrompt {
            prompt: String::new(),
            alt_text: String::new(),
        });

        let recipe = recipe.normalize().unwrap();
        let prompts: Vec<_> = recipe
            .blog_image_prompts
            .iter()
            .map(|p| p.prompt.as_str())
            .collect();
        assert_eq!(
            prompts,
            vec![
                "Tofu block",
                "Smoky Tofu Scramble: Sliced tofu",
                "Smoky Tofu Scramble, detail 3"
            ]
        );
    }

    #[test]
    fn normalize_rejects_recipe_without_instructions() {
        let mut recipe: GeneratedRecipe = serde_json::from_str(MODEL_RECIPE).unwrap();
        recipe.instructions.clear();
        assert!(recipe.normalize().is_err());
    }

    #[test]
    fn difficulty_serializes_capitalized() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Hard).unwrap(),
            "\"Hard\""
        );
        assert_eq!(Difficulty::parse_lenient("HARD"), Difficulty::Hard);
        assert_eq!(Difficulty::parse_lenient("whatever"), Difficulty::Medium);
    }

    #[test]
    fn main_image_prompt_falls_back_to_title() {
        let mut recipe: GeneratedRecipe = serde_json::from_str(MODEL_RECIPE).unwrap();
        recipe.image_prompt.clear();
        assert!(recipe.main_image_prompt().contains("Smoky Tofu Scramble"));
    }
}
