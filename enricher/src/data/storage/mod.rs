//! Durable storage for the resource tag cache
//!
//! Whole-value key/value storage with modification timestamps. The cache
//! uses the timestamp as the fetch time of a persisted entry.

mod error;
mod filesystem;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use error::StorageError;
pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;

/// Trait for cache storage backends
///
/// Writers are not coordinated: two processes refreshing the same key race
/// and the last write wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Read the whole value stored under `key`
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check if a value exists under `key`
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Last modification time of the value under `key`
    async fn modified(&self, key: &str) -> Result<DateTime<Utc>, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Reject keys that could escape the storage root
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
