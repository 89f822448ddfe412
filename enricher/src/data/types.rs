//! Shared data types
//!
//! `TaggedResource` and `Tag` serialize with the field names used by the
//! CloudWatch exporter's tagging client (`ARN`, `Namespace`, `Region`, `Tags`,
//! `Key`, `Value`) so cache files and resource files stay interchangeable.

use serde::{Deserialize, Serialize};

/// A resource tag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A cloud resource with its tags, as returned by resource discovery
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedResource {
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(rename = "Namespace", default)]
    pub namespace: String,
    #[serde(rename = "Region", default)]
    pub region: String,
    #[serde(rename = "Tags", default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
}

impl TaggedResource {
    /// Tags selected by an allow-list, in allow-list order.
    ///
    /// Every allowed key yields a tag, with an empty value when the resource
    /// does not carry it, so all metrics of a service get the same label set.
    pub fn metric_tags(&self, allowed: &[String]) -> Vec<Tag> {
        allowed
            .iter()
            .map(|key| {
                let value = self
                    .tags
                    .iter()
                    .find(|t| &t.key == key)
                    .map(|t| t.value.clone())
                    .unwrap_or_default();
                Tag::new(key.clone(), value)
            })
            .collect()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Tag>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A CloudWatch dimension (name/value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// Canonical identity of a CloudWatch metric sample
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricDescriptor {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
}

impl MetricDescriptor {
    /// Both namespace and metric name are present
    pub fn is_complete(&self) -> bool {
        !self.namespace.is_empty() && !self.metric_name.is_empty()
    }

    /// Value of the dimension called `name`, if any
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> TaggedResource {
        TaggedResource {
            arn: "arn:aws:ec2:us-east-1:123456789012:instance/i-1".to_string(),
            namespace: "AWS/EC2".to_string(),
            region: "us-east-1".to_string(),
            tags: vec![Tag::new("Name", "web"), Tag::new("Environment", "prod")],
        }
    }

    #[test]
    fn test_tagged_resource_json_field_names() {
        let json = serde_json::to_value(resource()).unwrap();
        assert_eq!(json["ARN"], "arn:aws:ec2:us-east-1:123456789012:instance/i-1");
        assert_eq!(json["Namespace"], "AWS/EC2");
        assert_eq!(json["Region"], "us-east-1");
        assert_eq!(json["Tags"][0]["Key"], "Name");
        assert_eq!(json["Tags"][0]["Value"], "web");
    }

    #[test]
    fn test_tagged_resource_null_tags() {
        let parsed: TaggedResource =
            serde_json::from_str(r#"{"ARN":"arn:x","Namespace":"AWS/S3","Region":"","Tags":null}"#)
                .unwrap();
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn test_metric_tags_allow_list_order() {
        let tags = resource().metric_tags(&["Environment".to_string(), "Name".to_string()]);
        assert_eq!(
            tags,
            vec![Tag::new("Environment", "prod"), Tag::new("Name", "web")]
        );
    }

    #[test]
    fn test_metric_tags_missing_key_has_empty_value() {
        let tags = resource().metric_tags(&["Team".to_string()]);
        assert_eq!(tags, vec![Tag::new("Team", "")]);
    }

    #[test]
    fn test_descriptor_completeness() {
        let mut d = MetricDescriptor {
            namespace: "AWS/EC2".to_string(),
            metric_name: "CPUUtilization".to_string(),
            dimensions: vec![],
        };
        assert!(d.is_complete());
        d.metric_name.clear();
        assert!(!d.is_complete());
    }
}
