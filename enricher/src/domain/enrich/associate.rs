//! Metric-to-resource association

use crate::data::types::{MetricDescriptor, TaggedResource};

/// Result of matching a metric against the resources of its namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Association<'r> {
    /// Matched resource, if any
    pub resource: Option<&'r TaggedResource>,
    /// The metric belongs to a resource that was not found; do not attach tags
    pub skip: bool,
}

impl<'r> Association<'r> {
    pub fn matched(resource: &'r TaggedResource) -> Self {
        Self {
            resource: Some(resource),
            skip: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            resource: None,
            skip: true,
        }
    }

    /// The resource whose tags apply to the metric
    pub fn tagged_resource(&self) -> Option<&'r TaggedResource> {
        self.resource.filter(|_| !self.skip)
    }
}

/// Maps CloudWatch metrics to tagged resources
pub trait Associator: Send + Sync {
    /// Whether metrics of `namespace` can be associated at all
    fn supports(&self, namespace: &str) -> bool;

    fn associate<'r>(
        &self,
        descriptor: &MetricDescriptor,
        resources: &'r [TaggedResource],
    ) -> Association<'r>;
}
