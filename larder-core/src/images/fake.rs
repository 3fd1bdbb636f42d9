//! Fake image generator for tests and offline runs.

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use super::{ImageError, ImageGenerator};

/// Encode a small solid-colour PNG whose colour is derived from `seed`.
pub fn placeholder_png(seed: &str) -> Result<Vec<u8>, ImageError> {
    let digest = Sha256::digest(seed.as_bytes());
    let image = RgbImage::from_pixel(8, 8, Rgb([digest[0], digest[1], digest[2]]));

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ImageError::InvalidImage(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Returns a valid PNG for every prompt, unless the prompt contains the
/// configured failure substring.
#[derive(Debug, Default)]
pub struct FakeImageGenerator {
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeImageGenerator {
    pub fn failing_on(prompt_contains: &str) -> Self {
        Self {
            fail_on: Some(prompt_contains.to_lowercase()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if let Some(pattern) = &self.fail_on {
            if prompt.to_lowercase().contains(pattern) {
                return Err(ImageError::ApiError {
                    status: 503,
                    message: "Model is currently loading".to_string(),
                });
            }
        }
        placeholder_png(prompt)
    }
}
