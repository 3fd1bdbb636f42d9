use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;

use crate::error::{PipelineError, Stage};
use crate::json_repair::{parse_with_repair, JsonShape};
use crate::llm::LlmProvider;
use crate::prompts::{render_comments_prompt, COMMENTS_PROMPT_NAME};
use crate::types::{GeneratedRecipe, SeedComment};

pub const COMMENTS_MAX_TOKENS: u32 = 1000;

const MIN_COMMENTS: usize = 3;
const MAX_COMMENTS: usize = 7;
const MIN_AGE_DAYS: i64 = 5;
const MAX_AGE_DAYS: i64 = 7;

/// A comment as the model writes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(
        alias = "user",
        alias = "author",
        default,
        deserialize_with = "crate::types::lenient::text"
    )]
    pub name: String,
    #[serde(
        alias = "comment",
        alias = "text",
        default,
        deserialize_with = "crate::types::lenient::text"
    )]
    pub content: String,
}

/// Generate 3-7 short reader comments for a recipe.
///
/// Failures are returned to the caller; the publish chain treats this stage
/// as non-critical.
pub async fn generate_comments(
    provider: &dyn LlmProvider,
    recipe: &GeneratedRecipe,
    max_retries: u32,
) -> Result<Vec<SeedComment>, PipelineError> {
    comments_for(provider, &recipe.title, &recipe.blog_summary, max_retries).await
}

/// Comments for a recipe known only by title and blog summary, such as one
/// already in the database.
pub async fn comments_for(
    provider: &dyn LlmProvider,
    title: &str,
    summary: &str,
    max_retries: u32,
) -> Result<Vec<SeedComment>, PipelineError> {
    let count = rand::rng().random_range(MIN_COMMENTS..=MAX_COMMENTS);
    let prompt = render_comments_prompt(title, summary, count);

    tracing::info!(prompt = COMMENTS_PROMPT_NAME, title, count, "generating comments");

    let raw = provider
        .complete(&prompt, COMMENTS_MAX_TOKENS)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Comments, e))?;

    let comments: Vec<RawComment> =
        parse_with_repair(provider, &raw, JsonShape::Array, max_retries)
            .await
            .map_err(|e| PipelineError::from_repair(Stage::Comments, e))?;

    let comments: Vec<RawComment> = comments.into_iter().take(count).collect();
    Ok(backdate_comments(comments, Utc::now(), &mut rand::rng()))
}

/// Stamp each comment with a time 5-7 days before `now`, keeping order.
/// Comments without content are dropped; missing names become "Anonymous".
pub fn backdate_comments<R: Rng + ?Sized>(
    comments: Vec<RawComment>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<SeedComment> {
    let min_secs = Duration::days(MIN_AGE_DAYS).num_seconds();
    let max_secs = Duration::days(MAX_AGE_DAYS).num_seconds();

    comments
        .into_iter()
        .filter(|c| !c.content.trim().is_empty())
        .map(|c| {
            let age = Duration::seconds(rng.random_range(min_secs..=max_secs));
            let user = c.name.trim();
            SeedComment {
                user: if user.is_empty() {
                    "Anonymous".to_string()
                } else {
                    user.to_string()
                },
                content: c.content.trim().to_string(),
                created_at: now - age,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raw(name: &str, content: &str) -> RawComment {
        RawComment {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn backdates_within_window_and_keeps_order() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(3);
        let comments = backdate_comments(
            vec![raw("Ana", "Loved it"), raw("", "Great"), raw("Bo", "  ")],
            now,
            &mut rng,
        );

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].user, "Ana");
        assert_eq!(comments[1].user, "Anonymous");
        for comment in &comments {
            let age = now - comment.created_at;
            assert!(age >= Duration::days(5) && age <= Duration::days(7));
        }
    }

    #[tokio::test]
    async fn generates_three_to_seven() {
        let provider = FakeProvider::with_response(
            "comments for a recipe titled",
            r#"[
                {"name": "A", "content": "1"}, {"name": "B", "content": "2"},
                {"name": "C", "content": "3"}, {"name": "D", "content": "4"},
                {"name": "E", "content": "5"}, {"name": "F", "content": "6"},
                {"name": "G", "content": "7"}, {"name": "H", "content": "8"}
            ]"#,
        );
        let recipe: GeneratedRecipe = serde_json::from_str(
            r#"{"title": "Lemon Bars", "ingredients": [{"name": "Lemon"}], "instructions": ["Bake"]}"#,
        )
        .unwrap();

        let comments = generate_comments(&provider, &recipe, 2).await.unwrap();
        assert!((3..=7).contains(&comments.len()));
        assert_eq!(comments[0].content, "1");
    }

    #[test]
    fn accepts_alternate_field_names() {
        let parsed: Vec<RawComment> =
            serde_json::from_str(r#"[{"user": "Kim", "comment": "Yum"}]"#).unwrap();
        assert_eq!(parsed[0].name, "Kim");
        assert_eq!(parsed[0].content, "Yum");
    }
}
