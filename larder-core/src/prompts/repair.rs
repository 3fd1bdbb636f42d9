//! Prompt asking the model to rewrite JSON that failed to parse.

/// Prompt name for logs.
pub const REPAIR_PROMPT_NAME: &str = "json_repair";

/// Render the repair prompt for `content`, naming the byte offset of the
/// parse error when one is known.
pub fn render_repair_prompt(content: &str, position: Option<usize>) -> String {
    let location = match position {
        Some(position) => format!(" at position {}", position),
        None => String::new(),
    };

    format!(
        "The following JSON has an error{location}. Please fix and rewrite the entire JSON correctly. \
Respond with the JSON only, no commentary:\n\n{content}",
        location = location,
        content = content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_position_when_known() {
        let prompt = render_repair_prompt("{\"a\": }", Some(6));
        assert!(prompt.contains("at position 6"));
        assert!(prompt.contains("rewrite the entire JSON correctly"));
        assert!(prompt.ends_with("{\"a\": }"));
    }

    #[test]
    fn omits_position_when_unknown() {
        let prompt = render_repair_prompt("", None);
        assert!(prompt.starts_with("The following JSON has an error. Please fix"));
    }
}
