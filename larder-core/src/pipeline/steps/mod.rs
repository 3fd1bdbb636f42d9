//! Steps of the publish chain: images, then comments, then the database write.

mod generate_comments;
mod generate_images;
mod save_recipe;

pub use generate_comments::GenerateCommentsStep;
pub use generate_images::GenerateImagesStep;
pub use save_recipe::SaveRecipeStep;
