//! Postgres persistence.
//!
//! [`PgRecipeStore`] is the publish boundary used by the pipeline; the
//! [`queries`] module holds the read side and the admin/visitor writes.

pub mod queries;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use larder_core::store::{NewPublication, RecipeStore, StoreError};
use larder_core::types::{
    BlogImage, Comment, Difficulty, Ingredient, PublishedRecipe, RecipeIngredient,
};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{
    BlogImageRow, CommentRow, IngredientRow, NewBlogImage, NewComment, NewIngredient, NewRecipe,
    NewRecipeIngredient, RecipeRow,
};
use crate::schema::{
    blog_images, categories, comments, ingredients, recipe_categories, recipe_ingredients,
    recipes,
};

#[derive(Clone)]
pub struct PgRecipeStore {
    pool: DbPool,
}

impl PgRecipeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn publish(&self, publication: NewPublication) -> Result<PublishedRecipe, StoreError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Database(e.to_string()))?;
            publish_recipe(&mut conn, &publication)
        })
        .await
        .map_err(|e| StoreError::Database(format!("publish task failed: {}", e)))?
    }
}

/// Write the recipe, its catalog ingredients, blog images and comments in a
/// single transaction.
///
/// Catalog rows are insert-or-ignore by name, so the first recipe to mention
/// an ingredient decides its unit.
pub fn publish_recipe(
    conn: &mut PgConnection,
    publication: &NewPublication,
) -> Result<PublishedRecipe, StoreError> {
    let rows = publication.ingredient_rows()?;
    let recipe = &publication.recipe;
    let slug = publication.slug();
    let instructions = publication.instructions_text();
    let nutrition = publication.nutrition_json();
    let recipe_id = Uuid::new_v4();

    conn.transaction::<_, DieselError, _>(|conn| {
        diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                id: recipe_id,
                slug: &slug,
                title: &recipe.title,
                description: &recipe.description,
                cooking_time: to_i32(recipe.cooking_time),
                difficulty: recipe.difficulty.as_str(),
                servings: to_i32(recipe.servings.max(1)),
                image_url: &publication.main_image_url,
                instructions: &instructions,
                nutrition: &nutrition,
                blog_content: &recipe.blog_content,
                blog_summary: &recipe.blog_summary,
            })
            .execute(conn)?;

        for (position, row) in rows.iter().enumerate() {
            diesel::insert_into(ingredients::table)
                .values(&NewIngredient {
                    id: Uuid::new_v4(),
                    name: &row.name,
                    unit: &row.unit,
                })
                .on_conflict(ingredients::name)
                .do_nothing()
                .execute(conn)?;

            let ingredient: IngredientRow = ingredients::table
                .filter(ingredients::name.eq(&row.name))
                .select(IngredientRow::as_select())
                .first(conn)?;

            diesel::insert_into(recipe_ingredients::table)
                .values(&NewRecipeIngredient {
                    id: Uuid::new_v4(),
                    recipe_id,
                    ingredient_id: ingredient.id,
                    quantity: row.quantity,
                    position: position as i32,
                })
                .execute(conn)?;
        }

        let images: Vec<NewBlogImage> = publication
            .blog_images
            .iter()
            .enumerate()
            .map(|(position, image)| NewBlogImage {
                id: Uuid::new_v4(),
                recipe_id,
                image_url: &image.image_url,
                alt_text: &image.alt_text,
                position: position as i32,
            })
            .collect();
        if !images.is_empty() {
            diesel::insert_into(blog_images::table)
                .values(&images)
                .execute(conn)?;
        }

        let seeded: Vec<NewComment> = publication
            .comments
            .iter()
            .map(|comment| NewComment {
                id: Uuid::new_v4(),
                recipe_id,
                user_name: &comment.user,
                content: &comment.content,
                created_at: comment.created_at,
            })
            .collect();
        if !seeded.is_empty() {
            diesel::insert_into(comments::table)
                .values(&seeded)
                .execute(conn)?;
        }

        Ok(())
    })
    .map_err(store_error)?;

    tracing::info!(recipe_id = %recipe_id, slug = %slug, ingredients = rows.len(), "recipe saved");

    load_recipe(conn, recipe_id)
        .map_err(store_error)?
        .ok_or(StoreError::NotFound)
}

/// Load a recipe with everything it owns.
pub fn load_recipe(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<PublishedRecipe>> {
    let row = recipes::table
        .find(id)
        .select(RecipeRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        Some(row) => hydrate(conn, row).map(Some),
        None => Ok(None),
    }
}

/// Attach ingredients, blog images, comments and categories to a row.
pub fn hydrate(conn: &mut PgConnection, row: RecipeRow) -> QueryResult<PublishedRecipe> {
    let ingredient_lines = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(row.id))
        .order(recipe_ingredients::position.asc())
        .select((recipe_ingredients::quantity, IngredientRow::as_select()))
        .load::<(f64, IngredientRow)>(conn)?
        .into_iter()
        .map(|(quantity, ingredient)| RecipeIngredient {
            quantity,
            ingredient: Ingredient {
                name: ingredient.name,
                unit: ingredient.unit,
            },
        })
        .collect();

    let images = blog_images::table
        .filter(blog_images::recipe_id.eq(row.id))
        .order(blog_images::position.asc())
        .select(BlogImageRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|image| BlogImage {
            image_url: image.image_url,
            alt_text: image.alt_text,
        })
        .collect();

    let recipe_comments = comments::table
        .filter(comments::recipe_id.eq(row.id))
        .order(comments::created_at.asc())
        .select(CommentRow::as_select())
        .load(conn)?
        .into_iter()
        .map(comment_from_row)
        .collect();

    let category_names = recipe_categories::table
        .inner_join(categories::table)
        .filter(recipe_categories::recipe_id.eq(row.id))
        .order(categories::name.asc())
        .select(categories::name)
        .load::<String>(conn)?;

    Ok(PublishedRecipe {
        id: row.id,
        slug: row.slug,
        title: row.title,
        description: row.description,
        cooking_time: row.cooking_time.max(0) as u32,
        difficulty: Difficulty::parse_lenient(&row.difficulty),
        servings: row.servings.max(1) as u32,
        image_url: row.image_url,
        instructions: split_instructions(&row.instructions),
        nutrition: serde_json::from_str(&row.nutrition).unwrap_or_default(),
        blog_content: row.blog_content,
        blog_summary: row.blog_summary,
        blog_images: images,
        ingredients: ingredient_lines,
        comments: recipe_comments,
        categories: category_names,
        featured: row.featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn comment_from_row(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        user: row.user_name,
        content: row.content,
        created_at: row.created_at,
    }
}

pub fn split_instructions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Map a diesel error onto the store taxonomy. Constraint violations are
/// kept apart from connection and query failures.
pub fn store_error(err: DieselError) -> StoreError {
    match err {
        DieselError::NotFound => StoreError::NotFound,
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation,
            info,
        ) => StoreError::Constraint(info.message().to_string()),
        other => StoreError::Database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_split_on_lines_and_skip_blanks() {
        assert_eq!(
            split_instructions("Boil water.\n\n  Add pasta. \nDrain."),
            vec!["Boil water.", "Add pasta.", "Drain."]
        );
        assert!(split_instructions("").is_empty());
    }

    #[test]
    fn large_counts_saturate() {
        assert_eq!(to_i32(45), 45);
        assert_eq!(to_i32(u32::MAX), i32::MAX);
    }

    #[test]
    fn ingredient_rows_read_the_catalog_unit() {
        let query = ingredients::table
            .filter(ingredients::name.eq("Sugar"))
            .select(IngredientRow::as_select());
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(sql.contains(r#""ingredients"."id""#));
        assert!(sql.contains(r#""ingredients"."unit""#));
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert!(matches!(
            store_error(DieselError::NotFound),
            StoreError::NotFound
        ));
        assert!(matches!(
            store_error(DieselError::RollbackTransaction),
            StoreError::Database(_)
        ));
    }
}
