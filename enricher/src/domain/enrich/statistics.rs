//! Summary-to-gauge statistic expansion
//!
//! A CloudWatch summary data point carries count, sum and quantiles. In
//! expansion mode each enabled statistic becomes its own gauge named the way
//! the CloudWatch exporter names it, e.g. `aws_ec2_cpuutilization_average`.

use std::collections::HashSet;

use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::metrics::v1::{
    Gauge, Metric, NumberDataPoint, SummaryDataPoint, metric, number_data_point,
};

use super::labels::LabelSet;
use crate::data::types::MetricDescriptor;
use crate::utils::prom::build_metric_name;

pub const SAMPLE_COUNT: &str = "SampleCount";
pub const SUM: &str = "Sum";
pub const AVERAGE: &str = "Average";
pub const MINIMUM: &str = "Minimum";
pub const MAXIMUM: &str = "Maximum";

/// Statistics enabled when none are configured
pub const DEFAULT_STATISTICS: [&str; 5] = [MAXIMUM, MINIMUM, AVERAGE, SUM, SAMPLE_COUNT];

/// Set of statistic names to emit as gauges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticSelection(HashSet<String>);

impl StatisticSelection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, statistic: &str) -> bool {
        self.0.contains(statistic)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StatisticSelection {
    fn default() -> Self {
        Self::new(DEFAULT_STATISTICS)
    }
}

/// Statistic name of a summary quantile: `0.0` is `Minimum`, `1.0` is
/// `Maximum`, `0.95` is `p95` and `0.999` is `p99_9`
pub fn quantile_to_statistic(quantile: f64) -> String {
    if quantile == 0.0 {
        return MINIMUM.to_string();
    }
    if quantile == 1.0 {
        return MAXIMUM.to_string();
    }

    let pct = quantile * 100.0;
    if pct.fract() == 0.0 {
        format!("p{:.0}", pct)
    } else {
        format!("p{}", format!("{:.1}", pct).replace('.', "_"))
    }
}

/// Gauge metric with a single double data point
pub fn new_gauge(
    name: String,
    value: f64,
    time_unix_nano: u64,
    start_time_unix_nano: u64,
    labels: LabelSet,
) -> Metric {
    Metric {
        name,
        data: Some(metric::Data::Gauge(Gauge {
            data_points: vec![NumberDataPoint {
                attributes: labels,
                start_time_unix_nano,
                time_unix_nano,
                value: Some(number_data_point::Value::AsDouble(value)),
                ..Default::default()
            }],
        })),
        ..Default::default()
    }
}

/// Expand one summary data point into gauges, in the order sample count,
/// sum, average, then quantiles as they appear in the data point
pub fn summary_to_gauges(
    descriptor: &MetricDescriptor,
    point: &SummaryDataPoint,
    labels: &[KeyValue],
    selection: &StatisticSelection,
) -> Vec<Metric> {
    let mut gauges = Vec::new();
    let mut push = |statistic: &str, value: f64| {
        gauges.push(new_gauge(
            build_metric_name(&descriptor.namespace, &descriptor.metric_name, statistic),
            value,
            point.time_unix_nano,
            point.start_time_unix_nano,
            labels.to_vec(),
        ));
    };

    if selection.contains(SAMPLE_COUNT) {
        push(SAMPLE_COUNT, point.count as f64);
    }
    if selection.contains(SUM) {
        push(SUM, point.sum);
    }
    if selection.contains(AVERAGE) && point.count > 0 {
        push(AVERAGE, point.sum / point.count as f64);
    }
    for qv in &point.quantile_values {
        let statistic = quantile_to_statistic(qv.quantile);
        if selection.contains(&statistic) {
            push(&statistic, qv.value);
        }
    }

    gauges
}
