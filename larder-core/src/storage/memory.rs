//! In-memory object store for tests and local runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{url_prefix, ObjectStore, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store backed by a map. Can be told to fail puts or deletes.
#[derive(Debug)]
pub struct MemoryObjectStore {
    prefix: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    puts: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    fail_put_after: Option<usize>,
    fail_deletes: bool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("larder-test", "s3.us-east-1.example.com")
    }
}

impl MemoryObjectStore {
    pub fn new(bucket: &str, host: &str) -> Self {
        Self {
            prefix: url_prefix("https", bucket, host),
            objects: Mutex::new(BTreeMap::new()),
            puts: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            fail_put_after: None,
            fail_deletes: false,
        }
    }

    /// Accept `n` uploads, then reject every following one.
    pub fn failing_puts_after(mut self, n: usize) -> Self {
        self.fail_put_after = Some(n);
        self
    }

    /// Reject every delete.
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful uploads so far, including ones later deleted.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Keys deleted so far, in order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if let Some(limit) = self.fail_put_after {
            if self.puts.load(Ordering::SeqCst) >= limit {
                return Err(StorageError::Rejected {
                    status: 503,
                    message: format!("refusing upload of {}", key),
                });
            }
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes {
            return Err(StorageError::Rejected {
                status: 500,
                message: format!("refusing delete of {}", key),
            });
        }
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.prefix)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_delete_round() {
        let store = MemoryObjectStore::new("bucket", "host.example");
        let url = store
            .put("recipes/a.png", vec![1, 2], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "https://bucket.host.example/recipes/a.png");
        assert_eq!(store.key_for_url(&url).as_deref(), Some("recipes/a.png"));
        assert_eq!(store.key_for_url("https://other.example/x"), None);

        store.delete("recipes/a.png").await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.deleted_keys(), vec!["recipes/a.png"]);
    }

    #[tokio::test]
    async fn fails_after_limit() {
        let store = MemoryObjectStore::default().failing_puts_after(1);
        assert!(store.put("a", vec![], "image/png").await.is_ok());
        assert!(store.put("b", vec![], "image/png").await.is_err());
        assert_eq!(store.put_count(), 1);
    }
}
