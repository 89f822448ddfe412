//! Metric stream records
//!
//! A metric stream record is a sequence of length-delimited
//! `ExportMetricsServiceRequest` messages.

pub mod codec;

pub use codec::{CodecError, decode_requests, encode_requests};
