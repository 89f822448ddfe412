//! Catalog of supported CloudWatch namespaces
//!
//! Each namespace lists ARN patterns whose named capture groups are CloudWatch
//! dimension names. A metric is associated with the resource whose ARN yields
//! the same values for those dimensions.

use std::collections::HashMap;

use regex::Regex;

use super::associate::{Association, Associator};
use crate::data::types::{MetricDescriptor, TaggedResource};

/// A supported namespace: tagging API resource types and ARN patterns
#[derive(Debug, Clone, Copy)]
pub struct ServiceDefinition<'a> {
    pub namespace: &'a str,
    /// Resource type filters of the tagging API, e.g. `ec2:instance`
    pub resource_filters: &'a [&'a str],
    /// ARN regexes whose named groups are dimension names
    pub arn_patterns: &'a [&'a str],
}

const fn service<'a>(
    namespace: &'a str,
    resource_filters: &'a [&'a str],
    arn_patterns: &'a [&'a str],
) -> ServiceDefinition<'a> {
    ServiceDefinition {
        namespace,
        resource_filters,
        arn_patterns,
    }
}

const LOAD_BALANCER_PATTERNS: &[&str] = &[
    ":(?P<TargetGroup>targetgroup/.+)",
    ":loadbalancer/(?P<LoadBalancer>.+)$",
];

/// Services known to the enricher
pub const BUILTIN_SERVICES: &[ServiceDefinition<'static>] = &[
    service("AWS/EC2", &["ec2:instance"], &["instance/(?P<InstanceId>[^/]+)"]),
    service("AWS/EBS", &["ec2:volume"], &["volume/(?P<VolumeId>[^/]+)"]),
    service(
        "AWS/Lambda",
        &["lambda:function"],
        &["function:(?P<FunctionName>[^/]+)"],
    ),
    service("AWS/SQS", &["sqs"], &["(?P<QueueName>[^:]+)$"]),
    service(
        "AWS/RDS",
        &["rds:db", "rds:cluster"],
        &[
            ":db:(?P<DBInstanceIdentifier>[^/]+)",
            ":cluster:(?P<DBClusterIdentifier>[^/]+)",
        ],
    ),
    service(
        "AWS/DynamoDB",
        &["dynamodb:table"],
        &[":table/(?P<TableName>[^/]+)"],
    ),
    service("AWS/S3", &["s3"], &["(?P<BucketName>[^:]+)$"]),
    service(
        "AWS/ApplicationELB",
        &[
            "elasticloadbalancing:loadbalancer/app",
            "elasticloadbalancing:targetgroup",
        ],
        LOAD_BALANCER_PATTERNS,
    ),
    service(
        "AWS/NetworkELB",
        &[
            "elasticloadbalancing:loadbalancer/net",
            "elasticloadbalancing:targetgroup",
        ],
        LOAD_BALANCER_PATTERNS,
    ),
    service("AWS/SNS", &["sns"], &["(?P<TopicName>[^:]+)$"]),
    service(
        "AWS/ECS",
        &["ecs:cluster", "ecs:service"],
        &[
            ":cluster/(?P<ClusterName>[^/]+)$",
            ":service/(?P<ClusterName>[^/]+)/(?P<ServiceName>[^/]+)$",
        ],
    ),
    service(
        "AWS/ElastiCache",
        &["elasticache:cluster"],
        &["cluster:(?P<CacheClusterId>[^/]+)"],
    ),
    service(
        "AWS/Kinesis",
        &["kinesis:stream"],
        &[":stream/(?P<StreamName>[^/]+)"],
    ),
    service(
        "AWS/Firehose",
        &["firehose"],
        &[":deliverystream/(?P<DeliveryStreamName>[^/]+)"],
    ),
    service("AWS/ES", &["es:domain"], &[":domain/(?P<DomainName>[^/]+)"]),
    service(
        "AWS/Logs",
        &["logs:log-group"],
        &[":log-group:(?P<LogGroupName>.+)"],
    ),
    service("AWS/States", &["states"], &["(?P<StateMachineArn>.*)"]),
];

/// ARN regex with the dimension names it captures
#[derive(Debug)]
struct DimensionPattern {
    regex: Regex,
    names: Vec<String>,
}

impl DimensionPattern {
    fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        let names = regex.capture_names().flatten().map(String::from).collect();
        Ok(Self { regex, names })
    }

    /// All captured dimensions are present on the metric
    fn applies_to(&self, descriptor: &MetricDescriptor) -> bool {
        self.names
            .iter()
            .all(|name| descriptor.dimension(name).is_some())
    }

    fn matches(&self, descriptor: &MetricDescriptor, resource: &TaggedResource) -> bool {
        let Some(caps) = self.regex.captures(&resource.arn) else {
            return false;
        };
        self.names.iter().all(|name| {
            caps.name(name).map(|m| m.as_str()) == descriptor.dimension(name)
        })
    }
}

#[derive(Debug, Default)]
struct Service {
    resource_filters: Vec<String>,
    patterns: Vec<DimensionPattern>,
}

/// Regex-driven associator over a namespace catalog
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    services: HashMap<String, Service>,
}

impl ServiceCatalog {
    /// Catalog of the built-in AWS services
    pub fn builtin() -> Self {
        Self::from_definitions(BUILTIN_SERVICES)
    }

    /// Build a catalog from service definitions.
    /// Patterns that fail to compile are logged and left out.
    pub fn from_definitions(definitions: &[ServiceDefinition<'_>]) -> Self {
        let mut catalog = Self::default();
        for def in definitions {
            let patterns = def
                .arn_patterns
                .iter()
                .filter_map(|pattern| match DimensionPattern::compile(pattern) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!(namespace = def.namespace, pattern, error = %e, "Invalid ARN pattern, ignoring");
                        None
                    }
                })
                .collect();
            catalog.services.insert(
                def.namespace.to_string(),
                Service {
                    resource_filters: def.resource_filters.iter().map(|f| f.to_string()).collect(),
                    patterns,
                },
            );
        }
        catalog
    }

    /// Supported namespaces, unordered
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Tagging API resource type filters per namespace
    pub fn resource_filters(&self) -> HashMap<String, Vec<String>> {
        self.services
            .iter()
            .map(|(namespace, svc)| (namespace.clone(), svc.resource_filters.clone()))
            .collect()
    }
}

impl Associator for ServiceCatalog {
    fn supports(&self, namespace: &str) -> bool {
        self.services.contains_key(namespace)
    }

    fn associate<'r>(
        &self,
        descriptor: &MetricDescriptor,
        resources: &'r [TaggedResource],
    ) -> Association<'r> {
        if descriptor.dimensions.is_empty() {
            return Association::default();
        }
        let Some(service) = self.services.get(&descriptor.namespace) else {
            return Association::default();
        };

        // Pattern covering the most dimensions; first one wins ties
        let best = service
            .patterns
            .iter()
            .filter(|p| !p.names.is_empty() && p.applies_to(descriptor))
            .fold(None::<&DimensionPattern>, |best, p| match best {
                Some(b) if b.names.len() >= p.names.len() => Some(b),
                _ => Some(p),
            });
        let Some(pattern) = best else {
            return Association::default();
        };

        match resources.iter().find(|r| pattern.matches(descriptor, r)) {
            Some(resource) => Association::matched(resource),
            None => {
                tracing::trace!(
                    namespace = %descriptor.namespace,
                    metric = %descriptor.metric_name,
                    "No resource matches metric dimensions"
                );
                Association::skipped()
            }
        }
    }
}
