use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;

use super::traits::{KeyValueStore, StorageError};

struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// In-process key-value store. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<(String, String), Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let map_key = (namespace.to_string(), key.to_string());
        let expired = match self.entries.get(&map_key) {
            None => return Ok(None),
            Some(entry) => match entry.expires_at {
                Some(at) if at <= Utc::now() => true,
                _ => return Ok(Some(entry.value.clone())),
            },
        };
        if expired {
            self.entries.remove(&map_key);
        }
        Ok(None)
    }

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let expires_at = ttl.map(|d| Utc::now() + d);
        self.entries.insert(
            (namespace.to_string(), key.to_string()),
            Entry { value, expires_at },
        );
        Ok(())
    }
}
