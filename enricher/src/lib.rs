//! CloudWatch metric stream enricher
//!
//! Decodes length-delimited OTLP metric stream records, attaches resource
//! tags and exporter-compatible labels to CloudWatch summaries, and
//! optionally expands them into per-statistic gauges.

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
