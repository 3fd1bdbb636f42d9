//! Synthetic reader comment prompt.

/// Prompt name for logs.
pub const COMMENTS_PROMPT_NAME: &str = "seed_comments";

/// Render the prompt asking for `count` short comments on a recipe.
pub fn render_comments_prompt(title: &str, summary: &str, count: usize) -> String {
    let context = if summary.trim().is_empty() {
        String::new()
    } else {
        format!(" The accompanying blog post is summarised as: \"{}\".", summary.trim())
    };

    format!(
        r#"Generate {count} unique, engaging, and mostly positive comments for a recipe titled "{title}".{context} The comments should be relevant to the recipe and reflect different aspects such as taste, ease of preparation, or personal experiences. Each comment should be concise, about 1-2 sentences long, and signed with a realistic first name. Format the output as a JSON array of objects like:
[
  {{ "name": "Random name", "content": "Comment content" }}
]"#,
        count = count,
        title = title,
        context = context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_count_and_title() {
        let prompt = render_comments_prompt("Lemon Bars", "Tangy and sweet", 5);
        assert!(prompt.starts_with("Generate 5 unique, engaging"));
        assert!(prompt.contains(r#"recipe titled "Lemon Bars""#));
        assert!(prompt.contains("Tangy and sweet"));
    }

    #[test]
    fn skips_empty_summary() {
        let prompt = render_comments_prompt("Lemon Bars", "  ", 3);
        assert!(!prompt.contains("summarised"));
    }
}
