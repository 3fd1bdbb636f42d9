use std::sync::Mutex;

use crate::storage::ObjectStore;

/// Keys uploaded during one publish attempt.
#[derive(Debug, Default)]
pub struct UploadLedger {
    keys: Mutex<Vec<String>>,
}

impl UploadLedger {
    pub fn record(&self, key: &str) {
        self.keys.lock().unwrap().push(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().unwrap().is_empty()
    }

    /// Delete every recorded object and clear the ledger.
    ///
    /// Delete failures are logged and skipped so they never replace the
    /// error that caused the rollback. Returns how many deletes succeeded.
    pub async fn rollback(&self, store: &dyn ObjectStore) -> usize {
        let keys = std::mem::take(&mut *self.keys.lock().unwrap());
        let mut deleted = 0;

        for key in &keys {
            match store.delete(key).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to delete object during rollback")
                }
            }
        }

        tracing::info!(deleted, recorded = keys.len(), "rolled back uploaded images");
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    #[tokio::test]
    async fn rollback_deletes_recorded_keys() {
        let store = MemoryObjectStore::default();
        let ledger = UploadLedger::default();
        for key in ["a.png", "b.png"] {
            store.put(key, vec![0], "image/png").await.unwrap();
            ledger.record(key);
        }
        store.put("unrelated.png", vec![0], "image/png").await.unwrap();

        assert_eq!(ledger.rollback(&store).await, 2);
        assert_eq!(store.keys(), vec!["unrelated.png"]);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn delete_failures_are_swallowed() {
        let store = MemoryObjectStore::default().failing_deletes();
        let ledger = UploadLedger::default();
        ledger.record("a.png");
        assert_eq!(ledger.rollback(&store).await, 0);
    }
}
