//! Filesystem-based cache storage
//!
//! One file per key directly under the base path: `{base_path}/{key}`.
//! The file modification time is the entry timestamp.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::{CacheStorage, StorageError, validate_key};

/// Filesystem-based cache storage
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    base_path: PathBuf,
}

impl FilesystemStorage {
    /// Create a new filesystem storage rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn map_not_found(key: &str, e: std::io::Error) -> StorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

#[async_trait]
impl CacheStorage for FilesystemStorage {
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.file_path(key)?;
        fs::read(&path)
            .await
            .map_err(|e| Self::map_not_found(key, e))
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.file_path(key)?;
        fs::create_dir_all(&self.base_path).await?;
        fs::write(&path, data).await?;

        tracing::trace!(key, size = data.len(), path = %path.display(), "Cache file written");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.file_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn modified(&self, key: &str) -> Result<DateTime<Utc>, StorageError> {
        let path = self.file_path(key)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::map_not_found(key, e))?;
        Ok(DateTime::<Utc>::from(metadata.modified()?))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
