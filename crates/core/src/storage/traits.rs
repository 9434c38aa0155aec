use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Namespaced key-value cache with optional expiry. Connectors use this to
/// memoize expensive point lookups across runs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` for both a missing and an expired entry.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError>;

    /// `ttl: None` stores the entry without expiry.
    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError>;
}

/// Flat byte storage addressed by slash-separated relative paths. Ingestors
/// persist normalized filings and manifests through this port.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
}
