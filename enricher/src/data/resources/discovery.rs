//! Resource discovery trait and errors

use async_trait::async_trait;
use thiserror::Error;

use crate::data::types::TaggedResource;

/// Errors from resource discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The namespace has no tagged resources. Callers treat this as an empty result.
    #[error("No tagged resources found for namespace {namespace}")]
    NoResources { namespace: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid resource data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Resource discovery failed: {0}")]
    Backend(String),
}

/// Trait for tagged-resource lookups
#[async_trait]
pub trait ResourceDiscovery: Send + Sync {
    /// Fetch all tagged resources of `namespace`, restricted to `region` when given
    async fn fetch(
        &self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, DiscoveryError>;
}
