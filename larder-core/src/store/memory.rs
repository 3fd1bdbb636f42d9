//! In-memory recipe store with the same atomicity as the database store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{NewPublication, RecipeStore, StoreError};
use crate::types::{Comment, Ingredient, PublishedRecipe, RecipeIngredient};

#[derive(Debug, Default, Clone)]
struct State {
    catalog: Vec<Ingredient>,
    recipes: Vec<PublishedRecipe>,
}

/// Writes go to a staged copy of the state that replaces the live state
/// only once every part of the publication succeeded.
#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    state: Mutex<State>,
    fail_commits: AtomicBool,
}

impl MemoryRecipeStore {
    /// Make every following publish fail at commit time, after all rows
    /// were staged.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn recipes(&self) -> Vec<PublishedRecipe> {
        self.state.lock().unwrap().recipes.clone()
    }

    pub fn catalog(&self) -> Vec<Ingredient> {
        self.state.lock().unwrap().catalog.clone()
    }

    pub fn ingredient(&self, name: &str) -> Option<Ingredient> {
        self.state
            .lock()
            .unwrap()
            .catalog
            .iter()
            .find(|i| i.name == name)
            .cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .recipes
            .iter()
            .map(|r| r.comments.len())
            .sum()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn publish(&self, publication: NewPublication) -> Result<PublishedRecipe, StoreError> {
        let mut live = self.state.lock().unwrap();
        let mut staged = live.clone();

        let rows = publication.ingredient_rows()?;
        let mut ingredients = Vec::with_capacity(rows.len());
        for row in rows {
            // Insert-or-ignore by exact name: the first writer's unit stays.
            let entry = match staged.catalog.iter().find(|i| i.name == row.name) {
                Some(existing) => existing.clone(),
                None => {
                    let created = Ingredient {
                        name: row.name,
                        unit: row.unit,
                    };
                    staged.catalog.push(created.clone());
                    created
                }
            };
            ingredients.push(RecipeIngredient {
                quantity: row.quantity,
                ingredient: entry,
            });
        }

        let now = Utc::now();
        let recipe = PublishedRecipe {
            id: Uuid::new_v4(),
            slug: publication.slug(),
            title: publication.recipe.title.clone(),
            description: publication.recipe.description.clone(),
            cooking_time: publication.recipe.cooking_time,
            difficulty: publication.recipe.difficulty,
            servings: publication.recipe.servings,
            image_url: publication.main_image_url.clone(),
            instructions: publication.recipe.instructions.clone(),
            nutrition: publication.recipe.nutrition.clone(),
            blog_content: publication.recipe.blog_content.clone(),
            blog_summary: publication.recipe.blog_summary.clone(),
            blog_images: publication.blog_images.clone(),
            ingredients,
            comments: publication
                .comments
                .iter()
                .map(|c| Comment {
                    id: Uuid::new_v4(),
                    user: c.user.clone(),
                    content: c.content.clone(),
                    created_at: c.created_at,
                })
                .collect(),
            categories: Vec::new(),
            featured: false,
            created_at: now,
            updated_at: now,
        };
        staged.recipes.push(recipe.clone());

        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Database("commit failed".to_string()));
        }

        *live = staged;
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeneratedRecipe;

    fn publication(title: &str, ingredients: &str) -> NewPublication {
        let recipe: GeneratedRecipe = serde_json::from_str(&format!(
            r#"{{"title": "{}", "ingredients": {}, "instructions": ["Mix"]}}"#,
            title, ingredients
        ))
        .unwrap();
        NewPublication {
            recipe,
            main_image_url: "https://b.example/main.png".to_string(),
            blog_images: vec![],
            comments: vec![],
        }
    }

    #[tokio::test]
    async fn first_writer_unit_wins() {
        let store = MemoryRecipeStore::default();
        store
            .publish(publication("Bread", r#"[{"name": "Flour", "quantity": "500", "unit": "g"}]"#))
            .await
            .unwrap();
        let second = store
            .publish(publication("Cake", r#"[{"name": "Flour", "quantity": "2", "unit": "cup"}]"#))
            .await
            .unwrap();

        assert_eq!(store.catalog().len(), 1);
        assert_eq!(store.ingredient("Flour").unwrap().unit, "g");
        assert_eq!(second.ingredients[0].ingredient.unit, "g");
        assert_eq!(second.ingredients[0].quantity, 2.0);
    }

    #[tokio::test]
    async fn failed_commit_leaves_nothing() {
        let store = MemoryRecipeStore::default();
        store.fail_commits(true);
        let result = store
            .publish(publication("Bread", r#"[{"name": "Flour", "quantity": "1", "unit": "g"}]"#))
            .await;

        assert!(result.is_err());
        assert!(store.recipes().is_empty());
        assert!(store.catalog().is_empty());
    }

    #[tokio::test]
    async fn blank_ingredient_aborts_whole_write() {
        let store = MemoryRecipeStore::default();
        let result = store
            .publish(publication(
                "Bread",
                r#"[{"name": "Flour", "quantity": "1", "unit": "g"}, {"name": ""}]"#,
            ))
            .await;

        assert!(matches!(result, Err(StoreError::Constraint(_))));
        assert!(store.catalog().is_empty());
    }
}
