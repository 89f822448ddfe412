use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue, KeyValueList, any_value};
use opentelemetry_proto::tonic::metrics::v1::{
    Gauge, NumberDataPoint, ResourceMetrics, ScopeMetrics, Summary,
    summary_data_point::ValueAtQuantile,
};
use opentelemetry_proto::tonic::resource::v1::Resource;

use super::*;
use crate::data::resources::{DiscoveryError, ResourceDiscovery, StaticResourceDiscovery};
use crate::data::storage::MemoryStorage;
use crate::data::types::{Tag, TaggedResource};
use crate::domain::enrich::catalog::ServiceCatalog;
use crate::utils::otlp::{any_value_str, string_attr};

const INSTANCE_ARN: &str = "arn:aws:ec2:us-east-1:123456789012:instance/i-1";

fn dimensions(dims: &[(&str, &str)]) -> KeyValue {
    KeyValue {
        key: "Dimensions".to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::KvlistValue(KeyValueList {
                values: dims.iter().map(|(k, v)| string_attr(*k, *v)).collect(),
            })),
        }),
    }
}

fn summary_point(namespace: &str, metric_name: &str, instance: &str) -> SummaryDataPoint {
    SummaryDataPoint {
        attributes: vec![
            string_attr("Namespace", namespace),
            string_attr("MetricName", metric_name),
            dimensions(&[("InstanceId", instance)]),
        ],
        start_time_unix_nano: 1_000,
        time_unix_nano: 2_000,
        count: 10,
        sum: 50.0,
        quantile_values: vec![
            ValueAtQuantile {
                quantile: 0.0,
                value: 1.0,
            },
            ValueAtQuantile {
                quantile: 1.0,
                value: 9.0,
            },
        ],
        ..Default::default()
    }
}

fn summary_metric(points: Vec<SummaryDataPoint>) -> Metric {
    Metric {
        name: "amazonaws.com/AWS/EC2/CPUUtilization".to_string(),
        data: Some(metric::Data::Summary(Summary {
            data_points: points,
        })),
        ..Default::default()
    }
}

fn gauge_metric() -> Metric {
    Metric {
        name: "passthrough".to_string(),
        data: Some(metric::Data::Gauge(Gauge {
            data_points: vec![NumberDataPoint::default()],
        })),
        ..Default::default()
    }
}

fn request(resource_attrs: &[(&str, &str)], metrics: Vec<Metric>) -> ExportMetricsServiceRequest {
    ExportMetricsServiceRequest {
        resource_metrics: vec![ResourceMetrics {
            resource: Some(Resource {
                attributes: resource_attrs
                    .iter()
                    .map(|(k, v)| string_attr(*k, *v))
                    .collect(),
                ..Default::default()
            }),
            scope_metrics: vec![ScopeMetrics {
                metrics,
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

fn stream_request(metrics: Vec<Metric>) -> ExportMetricsServiceRequest {
    request(
        &[
            ("cloud.account.id", "123456789012"),
            ("cloud.region", "us-east-1"),
        ],
        metrics,
    )
}

fn resources() -> StaticResourceDiscovery {
    StaticResourceDiscovery::new(HashMap::from([(
        "AWS/EC2".to_string(),
        vec![TaggedResource {
            arn: INSTANCE_ARN.to_string(),
            namespace: "AWS/EC2".to_string(),
            region: "us-east-1".to_string(),
            tags: vec![Tag::new("Name", "web"), Tag::new("Environment", "prod")],
        }],
    )]))
}

fn enricher(discovery: Arc<dyn ResourceDiscovery>, options: EnrichOptions) -> Enricher {
    let cache = ResourceTagCache::new(
        discovery,
        Some(Arc::new(MemoryStorage::new())),
        Duration::from_secs(3600),
    );
    Enricher::new(cache, Arc::new(ServiceCatalog::builtin()), options)
}

fn compat_options() -> EnrichOptions {
    EnrichOptions {
        default_region: Some("us-east-1".to_string()),
        ..Default::default()
    }
}

fn expansion_options() -> EnrichOptions {
    EnrichOptions {
        expand_statistics: true,
        ..compat_options()
    }
}

fn pairs(attrs: &[KeyValue]) -> Vec<(String, String)> {
    attrs
        .iter()
        .map(|kv| {
            (
                kv.key.clone(),
                kv.value.as_ref().map(any_value_str).unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn kv(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
}

fn metrics_of(batch: &[ExportMetricsServiceRequest]) -> &[Metric] {
    &batch[0].resource_metrics[0].scope_metrics[0].metrics
}

fn summary_points(m: &Metric) -> &[SummaryDataPoint] {
    match &m.data {
        Some(metric::Data::Summary(s)) => &s.data_points,
        _ => panic!("not a summary"),
    }
}

fn gauge_point(m: &Metric) -> &NumberDataPoint {
    match &m.data {
        Some(metric::Data::Gauge(g)) => &g.data_points[0],
        _ => panic!("not a gauge"),
    }
}

struct FailingDiscovery;

#[async_trait]
impl ResourceDiscovery for FailingDiscovery {
    async fn fetch(
        &self,
        _namespace: &str,
        _region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, DiscoveryError> {
        Err(DiscoveryError::Backend("access denied".to_string()))
    }
}

struct CountingDiscovery {
    inner: StaticResourceDiscovery,
    calls: AtomicUsize,
}

#[async_trait]
impl ResourceDiscovery for CountingDiscovery {
    async fn fetch(
        &self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(namespace, region).await
    }
}

#[tokio::test]
async fn test_compat_mode_renames_and_replaces_attributes() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-1",
    )])])];

    enricher.enrich(&mut batch).await.unwrap();

    let metrics = metrics_of(&batch);
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].name, "aws_ec2_cpuutilization");
    let point = &summary_points(&metrics[0])[0];
    assert_eq!(
        pairs(&point.attributes),
        vec![
            kv("region", "us-east-1"),
            kv("account_id", "123456789012"),
            kv("namespace", "AWS/EC2"),
            kv("name", INSTANCE_ARN),
            kv("dimension_instance_id", "i-1"),
            kv("tag_name", "web"),
            kv("tag_environment", "prod"),
        ]
    );
    assert_eq!(point.count, 10);
    assert_eq!(point.sum, 50.0);
}

#[tokio::test]
async fn test_compat_mode_statistic_suffix() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut point = summary_point("AWS/EC2", "CPUUtilization", "i-1");
    point.attributes.push(string_attr("statistic", "Maximum"));
    let mut batch = vec![stream_request(vec![summary_metric(vec![point])])];

    enricher.enrich(&mut batch).await.unwrap();
    assert_eq!(metrics_of(&batch)[0].name, "aws_ec2_cpuutilization_maximum");
}

#[tokio::test]
async fn test_expansion_mode_emits_gauges() {
    let mut enricher = enricher(Arc::new(resources()), expansion_options());
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-1",
    )])])];

    enricher.enrich(&mut batch).await.unwrap();

    let metrics = metrics_of(&batch);
    let names: Vec<_> = metrics.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "aws_ec2_cpuutilization_sample_count",
            "aws_ec2_cpuutilization_sum",
            "aws_ec2_cpuutilization_average",
            "aws_ec2_cpuutilization_minimum",
            "aws_ec2_cpuutilization_maximum",
        ]
    );

    let first = &gauge_point(&metrics[0]).attributes;
    for m in metrics {
        let point = gauge_point(m);
        assert_eq!(&point.attributes, first);
        assert_eq!(point.time_unix_nano, 2_000);
        assert_eq!(point.start_time_unix_nano, 1_000);
    }
    assert!(pairs(first).contains(&kv("name", INSTANCE_ARN)));
}

#[tokio::test]
async fn test_expansion_keeps_non_summary_in_place() {
    let mut enricher = enricher(Arc::new(resources()), expansion_options());
    let mut batch = vec![stream_request(vec![
        gauge_metric(),
        summary_metric(vec![summary_point("AWS/EC2", "CPUUtilization", "i-1")]),
        gauge_metric(),
    ])];

    enricher.enrich(&mut batch).await.unwrap();

    let metrics = metrics_of(&batch);
    assert_eq!(metrics.len(), 7);
    assert_eq!(metrics[0], gauge_metric());
    assert_eq!(metrics[6], gauge_metric());
}

#[tokio::test]
async fn test_compat_mode_non_summary_unchanged() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![stream_request(vec![gauge_metric()])];

    enricher.enrich(&mut batch).await.unwrap();
    assert_eq!(metrics_of(&batch), &[gauge_metric()]);
}

#[tokio::test]
async fn test_exported_tags_filter() {
    let options = EnrichOptions {
        labels: LabelOptions {
            exported_tags: vec!["Environment".to_string()],
            static_labels: BTreeMap::from([("team".to_string(), "core".to_string())]),
            ..Default::default()
        },
        ..compat_options()
    };
    let mut enricher = enricher(Arc::new(resources()), options);
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-1",
    )])])];

    enricher.enrich(&mut batch).await.unwrap();

    let labels = pairs(&summary_points(&metrics_of(&batch)[0])[0].attributes);
    assert!(labels.contains(&kv("tag_environment", "prod")));
    assert!(!labels.iter().any(|(k, _)| k == "tag_name"));
    assert_eq!(labels.last(), Some(&kv("custom_tag_team", "core")));
}

#[tokio::test]
async fn test_unmatched_instance_is_global() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-404",
    )])])];

    enricher.enrich(&mut batch).await.unwrap();

    let labels = pairs(&summary_points(&metrics_of(&batch)[0])[0].attributes);
    assert!(labels.contains(&kv("name", "global")));
    assert!(!labels.iter().any(|(k, _)| k.starts_with("tag_")));
}

#[tokio::test]
async fn test_unsupported_namespace_is_skipped() {
    let original = summary_metric(vec![summary_point("Custom/App", "Latency", "i-1")]);

    let mut compat = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![stream_request(vec![original.clone()])];
    compat.enrich(&mut batch).await.unwrap();
    assert_eq!(metrics_of(&batch), std::slice::from_ref(&original));

    let mut expansion = enricher(Arc::new(resources()), expansion_options());
    let mut batch = vec![stream_request(vec![original])];
    expansion.enrich(&mut batch).await.unwrap();
    assert!(metrics_of(&batch).is_empty());
}

#[tokio::test]
async fn test_incomplete_descriptor_is_skipped() {
    let mut point = summary_point("AWS/EC2", "CPUUtilization", "i-1");
    point.attributes.retain(|kv| kv.key != "MetricName");
    let original = summary_metric(vec![point]);

    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![stream_request(vec![original.clone()])];
    enricher.enrich(&mut batch).await.unwrap();
    assert_eq!(metrics_of(&batch), std::slice::from_ref(&original));
}

#[tokio::test]
async fn test_resource_failure_continue_skips_point() {
    let mut enricher = enricher(Arc::new(FailingDiscovery), expansion_options());
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-1",
    )])])];

    enricher.enrich(&mut batch).await.unwrap();
    assert!(metrics_of(&batch).is_empty());
}

#[tokio::test]
async fn test_resource_failure_abort_returns_error() {
    let options = EnrichOptions {
        continue_on_resource_failure: false,
        ..compat_options()
    };
    let mut enricher = enricher(Arc::new(FailingDiscovery), options);
    let mut batch = vec![stream_request(vec![summary_metric(vec![summary_point(
        "AWS/EC2",
        "CPUUtilization",
        "i-1",
    )])])];

    let result = enricher.enrich(&mut batch).await;
    assert!(matches!(
        result,
        Err(EnrichError::Resources { ref namespace, .. }) if namespace == "AWS/EC2"
    ));
}

#[tokio::test]
async fn test_default_region_when_stream_has_none() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let mut batch = vec![request(
        &[],
        vec![summary_metric(vec![summary_point("AWS/EC2", "CPUUtilization", "i-1")])],
    )];

    enricher.enrich(&mut batch).await.unwrap();

    let labels = pairs(&summary_points(&metrics_of(&batch)[0])[0].attributes);
    assert_eq!(labels[0], kv("region", "us-east-1"));
    assert_eq!(labels[1], kv("namespace", "AWS/EC2"));
}

#[tokio::test]
async fn test_resources_fetched_once_per_namespace() {
    let discovery = Arc::new(CountingDiscovery {
        inner: resources(),
        calls: AtomicUsize::new(0),
    });
    let mut enricher = enricher(discovery.clone(), expansion_options());

    for _ in 0..3 {
        let mut batch = vec![stream_request(vec![summary_metric(vec![
            summary_point("AWS/EC2", "CPUUtilization", "i-1"),
            summary_point("AWS/EC2", "NetworkIn", "i-1"),
        ])])];
        enricher.enrich(&mut batch).await.unwrap();
        assert_eq!(metrics_of(&batch).len(), 10);
    }
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resources_fetched_once_without_persistence() {
    let discovery = Arc::new(CountingDiscovery {
        inner: resources(),
        calls: AtomicUsize::new(0),
    });
    let cache = ResourceTagCache::new(discovery.clone(), None, Duration::from_secs(3600));
    let mut enricher = Enricher::new(cache, Arc::new(ServiceCatalog::builtin()), compat_options());

    let points = (0..50)
        .map(|_| summary_point("AWS/EC2", "CPUUtilization", "i-1"))
        .collect();
    let mut batch = vec![stream_request(vec![summary_metric(points)])];
    enricher.enrich(&mut batch).await.unwrap();

    assert_eq!(summary_points(&metrics_of(&batch)[0]).len(), 50);
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_enrich_record_round_trip() {
    let mut enricher = enricher(Arc::new(resources()), expansion_options());
    let input = encode_requests(&[
        stream_request(vec![summary_metric(vec![summary_point(
            "AWS/EC2",
            "CPUUtilization",
            "i-1",
        )])]),
        stream_request(vec![gauge_metric()]),
    ]);

    let output = enricher.enrich_record(&input).await.unwrap();
    let decoded = decode_requests(&output).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(metrics_of(&decoded).len(), 5);
    assert_eq!(metrics_of(&decoded[1..]), &[gauge_metric()]);
}

#[tokio::test]
async fn test_enrich_record_decode_error() {
    let mut enricher = enricher(Arc::new(resources()), compat_options());
    let result = enricher.enrich_record(&[0x03, 0x0a, 0x7f, 0x00]).await;
    assert!(matches!(result, Err(EnrichError::Codec(_))));
}
