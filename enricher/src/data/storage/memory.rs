//! In-memory cache storage
//!
//! Keeps entries in a process-local map. Timestamps can be overridden, which
//! makes TTL behavior reproducible without touching file mtimes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{CacheStorage, StorageError, validate_key};

struct StoredValue {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory cache storage
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value with an explicit modification time
    pub fn insert_at(&self, key: &str, data: &[u8], modified: DateTime<Utc>) {
        self.entries.lock().insert(
            key.to_string(),
            StoredValue {
                data: data.to_vec(),
                modified,
            },
        );
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        self.entries
            .lock()
            .get(key)
            .map(|v| v.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.insert_at(key, data, Utc::now());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.entries.lock().contains_key(key))
    }

    async fn modified(&self, key: &str) -> Result<DateTime<Utc>, StorageError> {
        validate_key(key)?;
        self.entries
            .lock()
            .get(key)
            .map(|v| v.modified)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let storage = MemoryStorage::new();
        storage.write("k", b"value").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap(), b"value");
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_at_sets_modified() {
        let storage = MemoryStorage::new();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        storage.insert_at("k", b"value", at);
        assert_eq!(storage.modified("k").await.unwrap(), at);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());
        assert!(!storage.exists("k").await.unwrap());
        assert!(matches!(
            storage.read("k").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.modified("k").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
