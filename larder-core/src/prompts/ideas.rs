//! Idea generation prompt.

/// Prompt name for logs.
pub const IDEAS_PROMPT_NAME: &str = "recipe_ideas";

/// How adventurous the ideas should be, derived from a 0-100 dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnovationBand {
    Classic,
    Balanced,
    Innovative,
}

impl InnovationBand {
    /// Below 30 is classic, above 70 innovative, everything else balanced.
    pub fn from_level(level: u8) -> Self {
        if level < 30 {
            InnovationBand::Classic
        } else if level > 70 {
            InnovationBand::Innovative
        } else {
            InnovationBand::Balanced
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            InnovationBand::Classic => "The recipe should be relatively classic and traditional.",
            InnovationBand::Balanced => {
                "The recipe should balance traditional elements with some innovative touches."
            }
            InnovationBand::Innovative => {
                "The recipe should be highly innovative and incorporate unexpected twists."
            }
        }
    }
}

/// Render the prompt for `count` ideas.
pub fn render_ideas_prompt(
    count: usize,
    direction: Option<&str>,
    cuisines: &[String],
    innovation: Option<InnovationBand>,
) -> String {
    let mut prompt = if count == 1 {
        "Generate 1 unique and creative recipe idea".to_string()
    } else {
        format!("Generate {} unique and creative recipe ideas", count)
    };

    if let Some(direction) = direction.map(str::trim).filter(|d| !d.is_empty()) {
        prompt.push_str(&format!(" based on the following direction: {}.", direction));
    } else {
        prompt.push('.');
    }

    if !cuisines.is_empty() {
        prompt.push_str(&format!(
            " The recipe should incorporate elements from the following cuisines: {}.",
            cuisines.join(", ")
        ));
    }

    if let Some(band) = innovation {
        prompt.push(' ');
        prompt.push_str(band.instruction());
    }

    prompt.push_str(
        " Each recipe should be delicious and suitable for a food blog. Include a catchy title \
and a brief, appetizing description for each. Ensure diversity in cooking methods and ingredients. \
Format the output as a JSON array of objects with 'title' and 'description' fields.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innovation_bands() {
        assert_eq!(InnovationBand::from_level(0), InnovationBand::Classic);
        assert_eq!(InnovationBand::from_level(29), InnovationBand::Classic);
        assert_eq!(InnovationBand::from_level(30), InnovationBand::Balanced);
        assert_eq!(InnovationBand::from_level(70), InnovationBand::Balanced);
        assert_eq!(InnovationBand::from_level(71), InnovationBand::Innovative);
        assert_eq!(InnovationBand::from_level(100), InnovationBand::Innovative);
    }

    #[test]
    fn renders_all_parts() {
        let prompt = render_ideas_prompt(
            3,
            Some("spicy vegan breakfast"),
            &["Mexican".to_string(), "Thai".to_string()],
            Some(InnovationBand::Innovative),
        );
        assert!(prompt.starts_with("Generate 3 unique and creative recipe ideas"));
        assert!(prompt.contains("direction: spicy vegan breakfast."));
        assert!(prompt.contains("cuisines: Mexican, Thai."));
        assert!(prompt.contains("unexpected twists"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn blank_direction_is_omitted() {
        let prompt = render_ideas_prompt(1, Some("   "), &[], None);
        assert!(prompt.starts_with("Generate 1 unique and creative recipe idea."));
        assert!(!prompt.contains("direction"));
        assert!(!prompt.contains("cuisines"));
    }
}
