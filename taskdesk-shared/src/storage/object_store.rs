/// Object storage client
///
/// Uploads raw file payloads to a remote object store and deletes them by
/// key. The store is modeled as a trait so the API server can be driven
/// against an in-memory implementation in tests.
///
/// The production implementation ([`HttpObjectStore`]) talks to an
/// S3-compatible HTTP endpoint: `PUT {endpoint}/{key}` to upload,
/// `DELETE {endpoint}/{key}` to remove. Every request carries a bounded
/// timeout so a stalled remote cannot hang a request indefinitely.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Error type for object storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Upload failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Remote delete failed
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Client construction failed
    #[error("Storage client error: {0}")]
    Client(String),
}

/// Locator for a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Public URL of the object
    pub url: String,

    /// Storage identifier, used for deletion
    pub key: String,
}

/// Remote object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a payload under the given key and returns its locator
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Deletes the object stored under the given key
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Configuration for the HTTP object store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Upload endpoint base URL
    pub endpoint: String,

    /// Base URL under which stored objects are publicly reachable
    pub public_base_url: String,

    /// Bearer token for the storage API
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// HTTP-backed object store
///
/// Stateless apart from the connection-pooling `reqwest::Client`; safe to
/// share across requests behind an `Arc`.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    api_key: String,
}

impl HttpObjectStore {
    /// Builds the store from configuration
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Client` if the HTTP client cannot be built.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StorageError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError> {
        let response = self
            .client
            .put(format!("{}/{}", self.endpoint, key))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(format!(
                "Remote returned {}",
                response.status()
            )));
        }

        Ok(StoredObject {
            url: format!("{}/{}", self.public_base_url, key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.endpoint, key))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        // A missing remote object is treated as already deleted
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::Delete(format!(
                "Remote returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// In-memory object store for tests
///
/// Stores payloads in a map keyed by storage key. Uploads can be made to
/// fail, either immediately or after N further successes, for exercising
/// compensation paths.
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (String, Bytes)>>,
    puts_before_failure: AtomicI64,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            puts_before_failure: AtomicI64::new(i64::MAX),
        }
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent upload fail
    pub fn fail_uploads(&self, fail: bool) {
        let remaining = if fail { 0 } else { i64::MAX };
        self.puts_before_failure.store(remaining, Ordering::SeqCst);
    }

    /// Allows `n` more successful uploads, then fails the rest
    pub fn fail_after(&self, n: i64) {
        self.puts_before_failure.store(n, Ordering::SeqCst);
    }

    /// Number of objects currently stored
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// True when no objects are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when an object exists under the key
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError> {
        if self.puts_before_failure.fetch_sub(1, Ordering::SeqCst) <= 0 {
            return Err(StorageError::Upload("simulated upload failure".to_string()));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), bytes));

        Ok(StoredObject {
            url: format!("memory://{}", key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_put_and_delete() {
        let store = MemoryObjectStore::new();

        let stored = store
            .put("tasks/t1/a.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();

        assert_eq!(stored.key, "tasks/t1/a.pdf");
        assert_eq!(stored.url, "memory://tasks/t1/a.pdf");
        assert!(store.contains("tasks/t1/a.pdf"));

        store.delete("tasks/t1/a.pdf").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_simulated_failure() {
        let store = MemoryObjectStore::new();
        store.fail_uploads(true);

        let result = store
            .put("key", "application/pdf", Bytes::from_static(b"%PDF-"))
            .await;

        assert!(matches!(result, Err(StorageError::Upload(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_delete_missing_key_is_ok() {
        let store = MemoryObjectStore::new();
        assert!(store.delete("never-stored").await.is_ok());
    }
}
