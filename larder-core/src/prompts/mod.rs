//! Prompt templates for every model call the pipeline makes.

pub mod comments;
pub mod directions;
pub mod ideas;
pub mod recipe;
pub mod repair;

pub use comments::{render_comments_prompt, COMMENTS_PROMPT_NAME};
pub use directions::{render_directions_prompt, DirectionSeeds, DIRECTIONS_PROMPT_NAME};
pub use ideas::{render_ideas_prompt, InnovationBand, IDEAS_PROMPT_NAME};
pub use recipe::{render_recipe_prompt, RECIPE_PROMPT_NAME};
pub use repair::{render_repair_prompt, REPAIR_PROMPT_NAME};
