//! Object storage for generated images.
//!
//! The pipeline only needs put, delete and the public URL scheme
//! `https://<bucket>.<storage-host>/<key>`, so the trait stays that small.

mod memory;
mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    RequestFailed(String),

    #[error("storage returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

/// S3-compatible object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Upload `bytes` under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    /// Delete the object stored under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Inverse of [`ObjectStore::public_url`]. `None` for foreign URLs.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Public URL prefix shared by both implementations.
pub(crate) fn url_prefix(scheme: &str, bucket: &str, host: &str) -> String {
    format!("{}://{}.{}/", scheme, bucket, host)
}
