//! Cache error types

use thiserror::Error;

use crate::data::resources::DiscoveryError;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Refreshing a namespace failed. Recoverable: the caller decides whether
    /// to skip the namespace or abort.
    #[error("Failed to refresh resources for namespace {namespace}: {source}")]
    Discovery {
        namespace: String,
        #[source]
        source: DiscoveryError,
    },
}
