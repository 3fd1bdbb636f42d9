//! Persistence boundary for finished recipes.
//!
//! A store writes one [`NewPublication`] atomically: catalog ingredients,
//! the recipe row, its blog images and its comments either all become
//! visible or none do.

mod memory;

pub use memory::MemoryRecipeStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::slug::slugify;
use crate::types::{BlogImage, GeneratedRecipe, PublishedRecipe, SeedComment};

/// Quantity stored when the model's value is missing or not a number.
pub const DEFAULT_QUANTITY: f64 = 1.0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("not found")]
    NotFound,
}

/// Everything needed to persist one recipe.
#[derive(Debug, Clone)]
pub struct NewPublication {
    pub recipe: GeneratedRecipe,
    pub main_image_url: String,
    pub blog_images: Vec<BlogImage>,
    pub comments: Vec<SeedComment>,
}

impl NewPublication {
    pub fn slug(&self) -> String {
        slugify(&self.recipe.title)
    }

    /// Instructions stored as one newline-joined text column.
    pub fn instructions_text(&self) -> String {
        self.recipe.instructions.join("\n")
    }

    /// Nutrition stored as JSON text.
    pub fn nutrition_json(&self) -> String {
        serde_json::to_string(&self.recipe.nutrition).unwrap_or_else(|_| "{}".to_string())
    }

    /// Ingredient lines with names checked and quantities coerced.
    pub fn ingredient_rows(&self) -> Result<Vec<IngredientRow>, StoreError> {
        self.recipe
            .ingredients
            .iter()
            .map(|line| {
                let name = line.name.trim();
                if name.is_empty() {
                    return Err(StoreError::Constraint(
                        "ingredient name must not be empty".to_string(),
                    ));
                }
                Ok(IngredientRow {
                    name: name.to_string(),
                    unit: line.unit.trim().to_string(),
                    quantity: coerce_quantity(&line.quantity),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientRow {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
}

/// Coerce a model-written quantity to a float.
///
/// Accepts plain numbers ("2", "0.5"), simple fractions ("1/2") and mixed
/// numbers ("1 1/2"). Anything else, including empty and non-finite values,
/// becomes [`DEFAULT_QUANTITY`].
pub fn coerce_quantity(raw: &str) -> f64 {
    parse_quantity(raw.trim())
        .filter(|q| q.is_finite() && *q >= 0.0)
        .unwrap_or(DEFAULT_QUANTITY)
}

fn parse_quantity(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<f64>() {
        return Some(value);
    }
    if let Some((whole, fraction)) = raw.split_once(' ') {
        let whole: f64 = whole.parse().ok()?;
        return parse_fraction(fraction.trim()).map(|f| whole + f);
    }
    parse_fraction(raw)
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let (numerator, denominator) = raw.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Transactional recipe persistence.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Persist a publication in one atomic write.
    async fn publish(&self, publication: NewPublication) -> Result<PublishedRecipe, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numbers_and_fractions() {
        assert_eq!(coerce_quantity("2"), 2.0);
        assert_eq!(coerce_quantity(" 0.25 "), 0.25);
        assert_eq!(coerce_quantity("1/2"), 0.5);
        assert_eq!(coerce_quantity("1 1/2"), 1.5);
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(coerce_quantity(""), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity("a pinch"), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity("1/0"), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity("NaN"), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity("inf"), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity("-3"), DEFAULT_QUANTITY);
    }

    #[test]
    fn ingredient_rows_reject_blank_names() {
        let recipe: GeneratedRecipe = serde_json::from_str(
            r#"{"title": "Cake", "ingredients": [{"name": "Sugar", "quantity": "2", "unit": "cup"}, {"name": " "}]}"#,
        )
        .unwrap();
        let publication = NewPublication {
            recipe,
            main_image_url: String::new(),
            blog_images: vec![],
            comments: vec![],
        };
        assert!(matches!(
            publication.ingredient_rows(),
            Err(StoreError::Constraint(_))
        ));
    }
}
