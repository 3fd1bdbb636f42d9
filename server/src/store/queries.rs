//! Read-side queries and the smaller writes behind the admin and visitor
//! endpoints.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use larder_core::types::SeedComment;
use uuid::Uuid;

use crate::models::{CommentRow, NewComment, RecipeChanges, RecipeRow};
use crate::schema::{blog_images, categories, comments, recipe_categories, recipes};

pub const LATEST_LIMIT: i64 = 6;
pub const FEATURED_LIMIT: i64 = 3;
pub const SEARCH_LIMIT: i64 = 10;
pub const RELATED_LIMIT: i64 = 3;

pub fn latest(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<RecipeRow>> {
    recipes::table
        .order(recipes::created_at.desc())
        .limit(limit)
        .select(RecipeRow::as_select())
        .load(conn)
}

/// Flagged recipes, newest first. Falls back to the latest recipes when
/// nothing is flagged.
pub fn featured(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<RecipeRow>> {
    let flagged = recipes::table
        .filter(recipes::featured.eq(true))
        .order(recipes::created_at.desc())
        .limit(limit)
        .select(RecipeRow::as_select())
        .load(conn)?;
    if flagged.is_empty() {
        return latest(conn, limit);
    }
    Ok(flagged)
}

/// Case-insensitive substring match on title or description.
pub fn search(conn: &mut PgConnection, term: &str, limit: i64) -> QueryResult<Vec<RecipeRow>> {
    let pattern = format!("%{}%", escape_like(term.trim()));
    recipes::table
        .filter(
            recipes::title
                .ilike(&pattern)
                .or(recipes::description.ilike(&pattern)),
        )
        .order(recipes::created_at.desc())
        .limit(limit)
        .select(RecipeRow::as_select())
        .load(conn)
}

/// The newest recipe with this slug. Slugs are not unique.
pub fn by_slug(conn: &mut PgConnection, slug: &str) -> QueryResult<Option<RecipeRow>> {
    recipes::table
        .filter(recipes::slug.eq(slug))
        .order(recipes::created_at.desc())
        .select(RecipeRow::as_select())
        .first(conn)
        .optional()
}

pub fn by_id(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<RecipeRow>> {
    recipes::table
        .find(id)
        .select(RecipeRow::as_select())
        .first(conn)
        .optional()
}

/// Recipes sharing at least one category with `id`. A recipe without
/// categories gets the latest other recipes instead.
pub fn related(conn: &mut PgConnection, id: Uuid, limit: i64) -> QueryResult<Vec<RecipeRow>> {
    let category_ids: Vec<Uuid> = recipe_categories::table
        .filter(recipe_categories::recipe_id.eq(id))
        .select(recipe_categories::category_id)
        .load(conn)?;

    if category_ids.is_empty() {
        return recipes::table
            .filter(recipes::id.ne(id))
            .order(recipes::created_at.desc())
            .limit(limit)
            .select(RecipeRow::as_select())
            .load(conn);
    }

    let related_ids: Vec<Uuid> = recipe_categories::table
        .filter(recipe_categories::category_id.eq_any(&category_ids))
        .filter(recipe_categories::recipe_id.ne(id))
        .select(recipe_categories::recipe_id)
        .distinct()
        .load(conn)?;

    recipes::table
        .filter(recipes::id.eq_any(&related_ids))
        .order(recipes::created_at.desc())
        .limit(limit)
        .select(RecipeRow::as_select())
        .load(conn)
}

/// Category names with the number of recipes in each, alphabetically.
pub fn categories_with_counts(conn: &mut PgConnection) -> QueryResult<Vec<(String, i64)>> {
    categories::table
        .left_join(recipe_categories::table)
        .group_by((categories::id, categories::name))
        .select((
            categories::name,
            diesel::dsl::count(recipe_categories::recipe_id.nullable()),
        ))
        .order(categories::name.asc())
        .load(conn)
}

/// Apply `changes` and return the updated row, or `None` for an unknown id.
pub fn update_recipe(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &RecipeChanges,
) -> QueryResult<Option<RecipeRow>> {
    diesel::update(recipes::table.find(id))
        .set(changes)
        .returning(RecipeRow::as_returning())
        .get_result(conn)
        .optional()
}

/// Delete a recipe and return the image URLs it owned, main image first.
/// Owned rows go with it through the cascades.
pub fn delete_recipe(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<Vec<String>>> {
    conn.transaction(|conn| {
        let main: Option<String> = recipes::table
            .find(id)
            .select(recipes::image_url)
            .first(conn)
            .optional()?;
        let Some(main) = main else {
            return Ok(None);
        };

        let mut urls = vec![main];
        urls.extend(
            blog_images::table
                .filter(blog_images::recipe_id.eq(id))
                .order(blog_images::position.asc())
                .select(blog_images::image_url)
                .load::<String>(conn)?,
        );

        diesel::delete(recipes::table.find(id)).execute(conn)?;
        Ok(Some(urls))
    })
}

pub fn recipe_exists(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(recipes::table.find(id))).get_result(conn)
}

/// Comments on a recipe, newest first.
pub fn list_comments(conn: &mut PgConnection, recipe_id: Uuid) -> QueryResult<Vec<CommentRow>> {
    comments::table
        .filter(comments::recipe_id.eq(recipe_id))
        .order(comments::created_at.desc())
        .select(CommentRow::as_select())
        .load(conn)
}

/// How many comments `user_name` left on a recipe since `since`.
pub fn comments_since(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    user_name: &str,
    since: DateTime<Utc>,
) -> QueryResult<i64> {
    comments::table
        .filter(comments::recipe_id.eq(recipe_id))
        .filter(comments::user_name.eq(user_name))
        .filter(comments::created_at.gt(since))
        .count()
        .get_result(conn)
}

pub fn add_comment(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    user_name: &str,
    content: &str,
) -> QueryResult<CommentRow> {
    diesel::insert_into(comments::table)
        .values(&NewComment {
            id: Uuid::new_v4(),
            recipe_id,
            user_name,
            content,
            created_at: Utc::now(),
        })
        .returning(CommentRow::as_returning())
        .get_result(conn)
}

/// Store generated comments for an existing recipe.
pub fn add_seed_comments(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    seeded: &[SeedComment],
) -> QueryResult<usize> {
    if seeded.is_empty() {
        return Ok(0);
    }
    let rows: Vec<NewComment> = seeded
        .iter()
        .map(|comment| NewComment {
            id: Uuid::new_v4(),
            recipe_id,
            user_name: &comment.user,
            content: &comment.content,
            created_at: comment.created_at,
        })
        .collect();
    diesel::insert_into(comments::table)
        .values(&rows)
        .execute(conn)
}

/// Escape LIKE wildcards so user input matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
