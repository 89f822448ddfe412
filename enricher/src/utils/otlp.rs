//! OTLP utility functions
//!
//! Small helpers for reading and building OTLP `KeyValue` attributes.
//! CloudWatch Metric Streams only ever send string values, so anything
//! else reads as an empty string.

use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue, any_value};

/// Resource attribute keys set by CloudWatch Metric Streams
pub mod keys {
    pub const CLOUD_ACCOUNT_ID: &str = "cloud.account.id";
    pub const CLOUD_REGION: &str = "cloud.region";
}

/// Return the string payload of an AnyValue, or "" for any other type
pub fn any_value_str(value: &AnyValue) -> &str {
    match &value.value {
        Some(any_value::Value::StringValue(s)) => s,
        _ => "",
    }
}

/// Return the string value of the first attribute named `key`, or ""
pub fn attr_value<'a>(attrs: &'a [KeyValue], key: &str) -> &'a str {
    attrs
        .iter()
        .find(|kv| kv.key == key)
        .and_then(|kv| kv.value.as_ref())
        .map(any_value_str)
        .unwrap_or_default()
}

/// Build a string-valued attribute
pub fn string_attr(key: impl Into<String>, value: impl Into<String>) -> KeyValue {
    KeyValue {
        key: key.into(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.into())),
        }),
    }
}
