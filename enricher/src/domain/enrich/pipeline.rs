//! Enrichment orchestrator
//!
//! Walks a decoded metric stream batch and, for every summary data point,
//! resolves the metric's resource and rewrites it with exporter-compatible
//! labels. Each metric is transformed into zero or more output metrics:
//! - compatibility mode: the summary is kept, renamed, with labels as attributes
//! - expansion mode: the summary is replaced by one gauge per enabled statistic
//!
//! Non-summary metrics pass through unchanged in both modes.

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::metrics::v1::{Metric, SummaryDataPoint, metric};
use thiserror::Error;

use super::associate::Associator;
use super::context::ResourceContext;
use super::descriptor::extract_descriptor;
use super::labels::{LabelOptions, LabelSet, build_labels};
use super::statistics::{StatisticSelection, summary_to_gauges};
use crate::data::cache::{CacheError, ResourceTagCache};
use crate::data::types::MetricDescriptor;
use crate::domain::stream::{CodecError, decode_requests, encode_requests};
use crate::utils::otlp::attr_value;
use crate::utils::prom::build_metric_name;

/// Errors from enriching one record
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to get resources for namespace {namespace}")]
    Resources {
        namespace: String,
        #[source]
        source: CacheError,
    },
}

/// Enrichment settings of a run
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Replace summaries with per-statistic gauges
    pub expand_statistics: bool,
    pub statistics: StatisticSelection,
    pub labels: LabelOptions,
    /// Skip data points whose resources cannot be fetched instead of failing
    pub continue_on_resource_failure: bool,
    /// Region used when the stream carries none, and for resource lookups
    pub default_region: Option<String>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            expand_statistics: false,
            statistics: StatisticSelection::default(),
            labels: LabelOptions::default(),
            continue_on_resource_failure: true,
            default_region: None,
        }
    }
}

/// Per-invocation enrichment state: resource cache, associator and options
pub struct Enricher {
    cache: ResourceTagCache,
    associator: Arc<dyn Associator>,
    options: EnrichOptions,
}

impl Enricher {
    pub fn new(
        cache: ResourceTagCache,
        associator: Arc<dyn Associator>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            cache,
            associator,
            options,
        }
    }

    pub fn options(&self) -> &EnrichOptions {
        &self.options
    }

    /// Decode a record, enrich it and encode it again
    pub async fn enrich_record(&mut self, data: &[u8]) -> Result<Vec<u8>, EnrichError> {
        let mut batch = decode_requests(data)?;
        self.enrich(&mut batch).await?;
        Ok(encode_requests(&batch))
    }

    /// Enrich a batch in place.
    ///
    /// On error the batch may be partially transformed and should be discarded.
    pub async fn enrich(
        &mut self,
        batch: &mut [ExportMetricsServiceRequest],
    ) -> Result<(), EnrichError> {
        for request in batch.iter_mut() {
            for resource_metrics in &mut request.resource_metrics {
                let ctx = ResourceContext::from_resource(
                    resource_metrics.resource.as_ref(),
                    self.options.default_region.as_deref(),
                );

                for scope_metrics in &mut resource_metrics.scope_metrics {
                    let metrics = std::mem::take(&mut scope_metrics.metrics);
                    let mut transformed = Vec::with_capacity(metrics.len());
                    for metric in metrics {
                        transformed.extend(self.transform_metric(metric, &ctx).await?);
                    }
                    scope_metrics.metrics = transformed;
                }
            }
        }
        Ok(())
    }

    async fn transform_metric(
        &mut self,
        mut metric: Metric,
        ctx: &ResourceContext,
    ) -> Result<Vec<Metric>, EnrichError> {
        let Some(metric::Data::Summary(summary)) = metric.data.as_mut() else {
            tracing::debug!(metric = %metric.name, "Unsupported metric type, passing through");
            return Ok(vec![metric]);
        };

        let mut gauges = Vec::new();
        let mut renamed = None;

        for point in &mut summary.data_points {
            let Some((descriptor, labels)) = self.resolve_labels(point, ctx).await? else {
                continue;
            };

            if self.options.expand_statistics {
                gauges.extend(summary_to_gauges(
                    &descriptor,
                    point,
                    &labels,
                    &self.options.statistics,
                ));
            } else {
                let statistic = match attr_value(&point.attributes, "Statistic") {
                    "" => attr_value(&point.attributes, "statistic"),
                    s => s,
                };
                renamed = Some(build_metric_name(
                    &descriptor.namespace,
                    &descriptor.metric_name,
                    statistic,
                ));
                point.attributes = labels;
            }
        }

        if self.options.expand_statistics {
            return Ok(gauges);
        }
        if let Some(name) = renamed {
            metric.name = name;
        }
        Ok(vec![metric])
    }

    /// Descriptor and labels of a data point, or `None` when it is skipped
    async fn resolve_labels(
        &mut self,
        point: &SummaryDataPoint,
        ctx: &ResourceContext,
    ) -> Result<Option<(MetricDescriptor, LabelSet)>, EnrichError> {
        let descriptor = extract_descriptor(&point.attributes);
        if !descriptor.is_complete() {
            tracing::debug!(
                namespace = %descriptor.namespace,
                metric = %descriptor.metric_name,
                "Metric name or namespace missing, skipping enrichment"
            );
            return Ok(None);
        }
        if !self.associator.supports(&descriptor.namespace) {
            tracing::debug!(
                namespace = %descriptor.namespace,
                metric = %descriptor.metric_name,
                "Unsupported namespace, skipping enrichment"
            );
            return Ok(None);
        }

        let resources = match self
            .cache
            .get(&descriptor.namespace, self.options.default_region.as_deref())
            .await
        {
            Ok(resources) => resources,
            Err(e) if self.options.continue_on_resource_failure => {
                tracing::error!(
                    namespace = %descriptor.namespace,
                    error = %e,
                    "Failed to get resources for namespace"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(EnrichError::Resources {
                    namespace: descriptor.namespace,
                    source: e,
                });
            }
        };

        let association = self.associator.associate(&descriptor, resources);
        let labels = build_labels(ctx, &association, &descriptor, &self.options.labels);
        Ok(Some((descriptor, labels)))
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
