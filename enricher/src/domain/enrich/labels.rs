//! Label construction in the CloudWatch exporter (YACE) layout
//!
//! Output order: `region`, `account_id`, `namespace`, `name`, then
//! `dimension_*`, `tag_*` and `custom_tag_*` labels. Source names are
//! normalized into Prometheus label names; names that stay invalid are
//! dropped with a warning.

use std::collections::BTreeMap;

use opentelemetry_proto::tonic::common::v1::KeyValue;

use super::associate::Association;
use super::context::ResourceContext;
use crate::data::types::MetricDescriptor;
use crate::utils::otlp::string_attr;
use crate::utils::prom::prom_label_name;

/// Ordered label pairs, no deduplication
pub type LabelSet = Vec<KeyValue>;

/// `name` value when no resource matched
pub const GLOBAL_NAME: &str = "global";

/// Label settings shared by every data point of a run
#[derive(Debug, Clone)]
pub struct LabelOptions {
    /// Tag allow-list; empty exports every tag
    pub exported_tags: Vec<String>,
    /// Static labels emitted as `custom_tag_*`
    pub static_labels: BTreeMap<String, String>,
    /// Emit static labels even when no resource matched
    pub default_labels: bool,
    /// Snake-case source names instead of only replacing separators
    pub snake_case: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            exported_tags: Vec::new(),
            static_labels: BTreeMap::new(),
            default_labels: false,
            snake_case: true,
        }
    }
}

/// Build the label set of one data point
pub fn build_labels(
    ctx: &ResourceContext,
    association: &Association<'_>,
    descriptor: &MetricDescriptor,
    options: &LabelOptions,
) -> LabelSet {
    let mut labels = LabelSet::new();

    if let Some(region) = ctx.region.as_deref().filter(|r| !r.is_empty()) {
        labels.push(string_attr("region", region));
    }
    if let Some(account_id) = ctx.account_id.as_deref().filter(|a| !a.is_empty()) {
        labels.push(string_attr("account_id", account_id));
    }
    if !descriptor.namespace.is_empty() {
        labels.push(string_attr("namespace", descriptor.namespace.as_str()));
    }

    let resource = association.tagged_resource();
    labels.push(string_attr(
        "name",
        resource.map_or(GLOBAL_NAME, |r| r.arn.as_str()),
    ));

    for dim in &descriptor.dimensions {
        push_label(&mut labels, "dimension_", &dim.name, &dim.value, options.snake_case);
    }

    if let Some(resource) = resource {
        if options.exported_tags.is_empty() {
            for tag in &resource.tags {
                push_label(&mut labels, "tag_", &tag.key, &tag.value, options.snake_case);
            }
        } else {
            for tag in resource.metric_tags(&options.exported_tags) {
                push_label(&mut labels, "tag_", &tag.key, &tag.value, options.snake_case);
            }
        }
    }

    if resource.is_some() || options.default_labels {
        for (key, value) in &options.static_labels {
            push_label(&mut labels, "custom_tag_", key, value, options.snake_case);
        }
    }

    labels
}

fn push_label(labels: &mut LabelSet, prefix: &str, source: &str, value: &str, snake_case: bool) {
    match prom_label_name(source, snake_case) {
        Some(name) => labels.push(string_attr(format!("{}{}", prefix, name), value)),
        None => {
            tracing::warn!(
                name = source,
                kind = prefix.trim_end_matches('_'),
                "Invalid Prometheus label name, dropping label"
            );
        }
    }
}
