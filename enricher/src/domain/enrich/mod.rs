//! Metric enrichment
//!
//! - `context` - Account and region of a resource group
//! - `descriptor` - CloudWatch metric identity from data point attributes
//! - `associate` / `catalog` - Metric-to-resource matching
//! - `labels` - Exporter-compatible label sets
//! - `statistics` - Summary-to-gauge expansion
//! - `pipeline` - Orchestrates the above over a batch

pub mod associate;
pub mod catalog;
pub mod context;
pub mod descriptor;
pub mod labels;
pub mod pipeline;
pub mod statistics;

pub use associate::{Association, Associator};
pub use catalog::ServiceCatalog;
pub use context::ResourceContext;
pub use labels::{LabelOptions, LabelSet};
pub use pipeline::{EnrichError, EnrichOptions, Enricher};
pub use statistics::{StatisticSelection, quantile_to_statistic};
