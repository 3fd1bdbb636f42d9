//! Hugging Face inference endpoint for text-to-image models.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{validate_image, ImageError, ImageGenerator};
use crate::config::ImageConfig;

#[derive(Debug)]
pub struct HfImageGenerator {
    api_key: String,
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

impl HfImageGenerator {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            url: config.url.clone(),
            timeout: config.timeout,
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .await
            .map_err(|e| ImageError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageError::ApiError { status, message });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::RequestFailed(e.to_string()))?
            .to_vec();

        validate_image(&bytes)?;
        Ok(bytes)
    }
}

#[async_trait]
impl ImageGenerator for HfImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        match tokio::time::timeout(self.timeout, self.request(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ImageError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
