//! Domain logic for CloudWatch metric streams
//!
//! - `stream` - Length-delimited OTLP record codec
//! - `enrich` - Resource tag enrichment and statistic expansion

pub mod enrich;
pub mod stream;

pub use enrich::Enricher;
