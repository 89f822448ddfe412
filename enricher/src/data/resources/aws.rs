//! Resource discovery via the AWS Resource Groups Tagging API

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_resourcegroupstaggingapi::Client;
use aws_sdk_resourcegroupstaggingapi::config::Region;
use parking_lot::Mutex;

use super::discovery::{DiscoveryError, ResourceDiscovery};
use crate::data::types::{Tag, TaggedResource};

/// Tagged-resource lookups through `GetResources`, one client per region
#[derive(Debug)]
pub struct AwsTaggingDiscovery {
    config: aws_config::SdkConfig,
    /// Resource type filters per CloudWatch namespace
    resource_filters: HashMap<String, Vec<String>>,
    clients: Mutex<HashMap<String, Client>>,
}

impl AwsTaggingDiscovery {
    pub async fn new(
        region: Option<String>,
        resource_filters: HashMap<String, Vec<String>>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(Region::new(region));
        }
        let config = config_loader.load().await;

        tracing::debug!(
            region = ?config.region(),
            namespaces = resource_filters.len(),
            "AWS tagging discovery initialized"
        );
        Self {
            config,
            resource_filters,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client(&self, region: Option<&str>) -> Client {
        let key = region.unwrap_or_default().to_string();
        self.clients
            .lock()
            .entry(key)
            .or_insert_with(|| {
                let mut builder = aws_sdk_resourcegroupstaggingapi::config::Builder::from(&self.config);
                if let Some(region) = region {
                    builder = builder.region(Region::new(region.to_string()));
                }
                Client::from_conf(builder.build())
            })
            .clone()
    }
}

/// Region component of an ARN (`arn:partition:service:region:account:resource`)
pub(crate) fn arn_region(arn: &str) -> &str {
    arn.split(':').nth(3).unwrap_or_default()
}

#[async_trait]
impl ResourceDiscovery for AwsTaggingDiscovery {
    async fn fetch(
        &self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, DiscoveryError> {
        let filters = match self.resource_filters.get(namespace) {
            Some(filters) if !filters.is_empty() => filters.clone(),
            _ => {
                return Err(DiscoveryError::NoResources {
                    namespace: namespace.to_string(),
                });
            }
        };

        let mut pages = self
            .client(region)
            .get_resources()
            .set_resource_type_filters(Some(filters))
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| DiscoveryError::Backend(e.to_string()))?;
            for mapping in page.resource_tag_mapping_list() {
                let Some(arn) = mapping.resource_arn() else {
                    continue;
                };
                resources.push(TaggedResource {
                    arn: arn.to_string(),
                    namespace: namespace.to_string(),
                    region: arn_region(arn).to_string(),
                    tags: mapping
                        .tags()
                        .iter()
                        .map(|t| Tag::new(t.key(), t.value()))
                        .collect(),
                });
            }
        }

        tracing::debug!(namespace, count = resources.len(), "Fetched tagged resources");
        if resources.is_empty() {
            return Err(DiscoveryError::NoResources {
                namespace: namespace.to_string(),
            });
        }
        Ok(resources)
    }
}
