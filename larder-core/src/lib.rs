pub mod blog;
pub mod config;
pub mod error;
pub mod generate;
pub mod images;
pub mod json_repair;
pub mod llm;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod slug;
pub mod storage;
pub mod store;
pub mod types;

pub use blog::{render_blog, BlogBlock};
pub use config::{ConfigError, ImageConfig, LlmConfig, PipelineConfig, StorageConfig};
pub use error::{PipelineError, Stage, OVERLOADED_MESSAGE};
pub use generate::IdeaRequest;
pub use images::{FakeImageGenerator, HfImageGenerator, ImageGenerator};
pub use json_repair::{extract_and_parse, parse_with_repair, JsonRepairError, JsonShape};
pub use llm::{create_provider, create_provider_from_env, FakeProvider, LlmError, LlmProvider};
pub use orchestrator::{
    BacklogHandle, Decision, Engine, GenerationSession, PreviewWizard, SessionState,
};
pub use slug::slugify;
pub use storage::{MemoryObjectStore, ObjectStore, S3ObjectStore, StorageError};
pub use store::{MemoryRecipeStore, NewPublication, RecipeStore, StoreError};
pub use types::{
    BlogImage, Comment, Difficulty, GeneratedRecipe, Ingredient, IngredientLine, Nutrition,
    PublishedRecipe, PublishedSummary, RecipeIdea, SeedComment,
};
