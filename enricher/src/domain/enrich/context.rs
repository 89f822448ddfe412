//! Resource-level context of a metric stream batch

use opentelemetry_proto::tonic::resource::v1::Resource;

use crate::utils::otlp::{any_value_str, keys};

/// Account and region of one `ResourceMetrics` group, computed once per group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceContext {
    pub account_id: Option<String>,
    pub region: Option<String>,
}

impl ResourceContext {
    /// Read `cloud.account.id` and `cloud.region`, falling back to
    /// `default_region` when the stream does not carry a region
    pub fn from_resource(resource: Option<&Resource>, default_region: Option<&str>) -> Self {
        let mut account_id = "";
        let mut region = "";
        for attr in resource.map(|r| r.attributes.as_slice()).unwrap_or_default() {
            let Some(value) = attr.value.as_ref() else {
                continue;
            };
            match attr.key.as_str() {
                keys::CLOUD_ACCOUNT_ID => account_id = any_value_str(value),
                keys::CLOUD_REGION => region = any_value_str(value),
                _ => {}
            }
        }

        let region = Some(region)
            .filter(|r| !r.is_empty())
            .or(default_region)
            .filter(|r| !r.is_empty());

        Self {
            account_id: Some(account_id).filter(|a| !a.is_empty()).map(String::from),
            region: region.map(String::from),
        }
    }
}
