//! Metric descriptor extraction from summary data point attributes
//!
//! CloudWatch Metric Streams put the metric identity in data point attributes:
//! `Namespace` and `MetricName` as strings, and `Dimensions` as a key/value
//! list of string dimension values.

use opentelemetry_proto::tonic::common::v1::{KeyValue, any_value};

use crate::data::types::{Dimension, MetricDescriptor};
use crate::utils::otlp::any_value_str;

const NAMESPACE: &str = "Namespace";
const METRIC_NAME: &str = "MetricName";
const DIMENSIONS: &str = "Dimensions";

/// Build a descriptor from data point attributes. Other attributes are ignored.
pub fn extract_descriptor(attrs: &[KeyValue]) -> MetricDescriptor {
    let mut descriptor = MetricDescriptor::default();

    for attr in attrs {
        let Some(value) = attr.value.as_ref() else {
            continue;
        };
        match attr.key.as_str() {
            NAMESPACE => descriptor.namespace = any_value_str(value).to_string(),
            METRIC_NAME => descriptor.metric_name = any_value_str(value).to_string(),
            DIMENSIONS => {
                if let Some(any_value::Value::KvlistValue(list)) = &value.value {
                    descriptor.dimensions.extend(list.values.iter().filter_map(|kv| {
                        kv.value.as_ref().map(|v| Dimension {
                            name: kv.key.clone(),
                            value: any_value_str(v).to_string(),
                        })
                    }));
                }
            }
            _ => {}
        }
    }

    descriptor
}
