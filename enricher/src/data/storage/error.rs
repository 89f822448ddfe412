//! Cache storage error types

use thiserror::Error;

/// Errors from durable cache storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
