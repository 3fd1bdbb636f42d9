use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub cooking_time: i32,
    pub difficulty: String,
    pub servings: i32,
    pub image_url: String,
    pub instructions: String,
    pub nutrition: String,
    pub blog_content: String,
    pub blog_summary: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub id: Uuid,
    pub slug: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub cooking_time: i32,
    pub difficulty: &'a str,
    pub servings: i32,
    pub image_url: &'a str,
    pub instructions: &'a str,
    pub nutrition: &'a str,
    pub blog_content: &'a str,
    pub blog_summary: &'a str,
}

/// Editable text fields. `None` leaves the column untouched.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<String>,
    pub servings: Option<i32>,
    pub instructions: Option<String>,
    pub blog_content: Option<String>,
    pub blog_summary: Option<String>,
    pub featured: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub unit: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
pub struct NewRecipeIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: f64,
    pub position: i32,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::blog_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct BlogImageRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub image_url: String,
    pub alt_text: String,
    pub position: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::blog_images)]
pub struct NewBlogImage<'a> {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub image_url: &'a str,
    pub alt_text: &'a str,
    pub position: i32,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct CommentRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment<'a> {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_name: &'a str,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::admin_sessions)]
pub struct NewAdminSession<'a> {
    pub id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}
