//! Image synthesis and storage.
//!
//! Each recipe gets a main image plus one image per blog prompt. Images are
//! generated concurrently, validated, then uploaded one by one. Every upload
//! is recorded in an [`UploadLedger`] so a later failure can delete them.

mod fake;
mod huggingface;
mod keys;
mod ledger;
mod validate;

pub use fake::{placeholder_png, FakeImageGenerator};
pub use huggingface::HfImageGenerator;
pub use keys::{image_key, next_timestamp, ImageRole};
pub use ledger::UploadLedger;
pub use validate::{validate_image, ALLOWED_FORMATS, MAX_FILE_SIZE};

use std::fmt;

use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;

use crate::error::PipelineError;
use crate::storage::ObjectStore;
use crate::types::{BlogImage, GeneratedRecipe};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image request failed: {0}")]
    RequestFailed(String),

    #[error("image model returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("image generation timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Text-to-image model.
#[async_trait]
pub trait ImageGenerator: Send + Sync + fmt::Debug {
    /// Generate one image for `prompt` and return its encoded bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError>;
}

/// One image to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub role: ImageRole,
    pub prompt: String,
    pub alt_text: String,
}

/// An uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub role: ImageRole,
    pub key: String,
    pub url: String,
    pub alt_text: String,
}

/// The main image plus the blog images of one recipe, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeImages {
    pub main_image_url: String,
    pub blog_images: Vec<BlogImage>,
}

impl RecipeImages {
    pub fn from_stored(stored: &[StoredImage]) -> Self {
        let mut images = RecipeImages::default();
        for image in stored {
            match image.role {
                ImageRole::Main => images.main_image_url = image.url.clone(),
                ImageRole::Blog(_) => images.blog_images.push(BlogImage {
                    image_url: image.url.clone(),
                    alt_text: image.alt_text.clone(),
                }),
            }
        }
        images
    }
}

/// The main image job followed by one job per blog prompt.
pub fn jobs_for(recipe: &GeneratedRecipe) -> Vec<ImageJob> {
    let mut jobs = vec![ImageJob {
        role: ImageRole::Main,
        prompt: recipe.main_image_prompt(),
        alt_text: recipe.image_alt_text.clone(),
    }];
    jobs.extend(
        recipe
            .blog_image_prompts
            .iter()
            .enumerate()
            .map(|(i, p)| ImageJob {
                role: ImageRole::Blog(i + 1),
                prompt: p.prompt.clone(),
                alt_text: p.alt_text.clone(),
            }),
    );
    jobs
}

/// Generate every job concurrently, then upload the results in job order.
///
/// Nothing is uploaded unless every image was generated. Each successful
/// upload is recorded in `ledger` before the next one starts; on an upload
/// failure the ledger holds exactly the objects that need deleting.
pub async fn synthesize_and_store(
    generator: &dyn ImageGenerator,
    store: &dyn ObjectStore,
    slug: &str,
    jobs: &[ImageJob],
    ledger: &UploadLedger,
) -> Result<Vec<StoredImage>, PipelineError> {
    tracing::info!(slug, count = jobs.len(), "generating images");

    let generated = join_all(jobs.iter().map(|job| generator.generate(&job.prompt))).await;

    let mut images = Vec::with_capacity(jobs.len());
    for (job, result) in jobs.iter().zip(generated) {
        let bytes = result.map_err(PipelineError::from_image)?;
        let content_type = validate_image(&bytes).map_err(PipelineError::from_image)?;
        images.push((job, bytes, content_type));
    }

    let mut stored = Vec::with_capacity(images.len());
    for (job, bytes, content_type) in images {
        let key = image_key(slug, job.role, next_timestamp());
        let url = store
            .put(&key, bytes, content_type)
            .await
            .map_err(PipelineError::from_storage)?;
        ledger.record(&key);
        stored.push(StoredImage {
            role: job.role,
            key,
            url,
            alt_text: job.alt_text.clone(),
        });
    }

    tracing::info!(slug, uploaded = stored.len(), "images stored");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::storage::MemoryObjectStore;
    use crate::types::BlogImagePrompt;

    fn recipe_with_blog_images(n: usize) -> GeneratedRecipe {
        let mut recipe: GeneratedRecipe = serde_json::from_str(
            r#"{"title": "Soup", "imagePrompt": "a bowl of soup", "imageAltText": "soup",
                "ingredients": [{"name": "Water"}], "instructions": ["Boil"]}"#,
        )
        .unwrap();
        recipe.blog_image_prompts = (1..=n)
            .map(|i| BlogImagePrompt {
                prompt: format!("blog shot {}", i),
                alt_text: format!("alt {}", i),
            })
            .collect();
        recipe
    }

    #[test]
    fn jobs_put_main_first() {
        let jobs = jobs_for(&recipe_with_blog_images(2));
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].role, ImageRole::Main);
        assert_eq!(jobs[2].role, ImageRole::Blog(2));
        assert_eq!(jobs[2].alt_text, "alt 2");
    }

    #[tokio::test]
    async fn uploads_everything_in_order() {
        let generator = FakeImageGenerator::default();
        let store = MemoryObjectStore::default();
        let ledger = UploadLedger::default();
        let jobs = jobs_for(&recipe_with_blog_images(2));

        let stored = synthesize_and_store(&generator, &store, "soup", &jobs, &ledger)
            .await
            .unwrap();

        assert_eq!(stored.len(), 3);
        assert!(stored[0].key.starts_with("recipes/soup-main-"));
        assert!(stored[1].key.starts_with("recipes/soup-blog-1-"));
        assert_eq!(ledger.keys().len(), 3);
        assert_eq!(store.get(&stored[0].key).unwrap().content_type, "image/png");

        let images = RecipeImages::from_stored(&stored);
        assert_eq!(images.main_image_url, stored[0].url);
        assert_eq!(images.blog_images.len(), 2);
    }

    #[tokio::test]
    async fn generation_failure_uploads_nothing() {
        let generator = FakeImageGenerator::failing_on("blog shot 2");
        let store = MemoryObjectStore::default();
        let ledger = UploadLedger::default();
        let jobs = jobs_for(&recipe_with_blog_images(3));

        let err = synthesize_and_store(&generator, &store, "soup", &jobs, &ledger)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Images));
        assert!(store.is_empty());
        assert!(ledger.is_empty());
        assert_eq!(generator.call_count(), 4);
    }

    #[tokio::test]
    async fn upload_failure_leaves_ledger_with_uploaded_keys() {
        let generator = FakeImageGenerator::default();
        let store = MemoryObjectStore::default().failing_puts_after(2);
        let ledger = UploadLedger::default();
        let jobs = jobs_for(&recipe_with_blog_images(3));

        let err = synthesize_and_store(&generator, &store, "soup", &jobs, &ledger)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Upload));
        let mut recorded = ledger.keys();
        recorded.sort();
        assert_eq!(recorded, store.keys());
        assert_eq!(recorded.len(), 2);
    }
}
