//! JSON-file resource discovery
//!
//! The file maps namespaces to tagged resources:
//!
//! ```text
//! {
//!   "AWS/EC2": [
//!     {"ARN": "arn:aws:ec2:us-east-1:123456789012:instance/i-0abc",
//!      "Namespace": "AWS/EC2", "Region": "us-east-1",
//!      "Tags": [{"Key": "Name", "Value": "web"}]}
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::discovery::{DiscoveryError, ResourceDiscovery};
use crate::data::types::TaggedResource;

/// Resource discovery backed by a fixed namespace → resources map
#[derive(Debug, Clone, Default)]
pub struct StaticResourceDiscovery {
    resources: HashMap<String, Vec<TaggedResource>>,
}

impl StaticResourceDiscovery {
    pub fn new(resources: HashMap<String, Vec<TaggedResource>>) -> Self {
        Self { resources }
    }

    /// Load the namespace map from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self, DiscoveryError> {
        let data = tokio::fs::read(path).await?;
        let resources: HashMap<String, Vec<TaggedResource>> = serde_json::from_slice(&data)?;

        tracing::debug!(
            path = %path.display(),
            namespaces = resources.len(),
            "Loaded resource file"
        );

        Ok(Self::new(resources))
    }
}

#[async_trait]
impl ResourceDiscovery for StaticResourceDiscovery {
    async fn fetch(
        &self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, DiscoveryError> {
        let resources: Vec<TaggedResource> = self
            .resources
            .get(namespace)
            .into_iter()
            .flatten()
            .filter(|r| match region {
                Some(region) => r.region.is_empty() || r.region == region,
                None => true,
            })
            .cloned()
            .collect();

        if resources.is_empty() {
            return Err(DiscoveryError::NoResources {
                namespace: namespace.to_string(),
            });
        }
        Ok(resources)
    }
}
