//! Model-backed generators: ideas, recipes, seed comments and directions.

mod comments;
mod directions;
mod ideas;
mod recipe;

pub use comments::{
    backdate_comments, comments_for, generate_comments, RawComment, COMMENTS_MAX_TOKENS,
};
pub use directions::{suggest_directions, DIRECTION_COUNT};
pub use ideas::{generate_ideas, IdeaRequest, IDEAS_MAX_TOKENS};
pub use recipe::{synthesize_recipe, RECIPE_MAX_TOKENS};
