//! Resource discovery
//!
//! Looks up tagged resources for a CloudWatch namespace. The enricher only
//! depends on the `ResourceDiscovery` trait:
//! - `AwsTaggingDiscovery` queries the Resource Groups Tagging API
//! - `StaticResourceDiscovery` serves resources from a JSON file

mod aws;
mod discovery;
mod static_file;

pub use aws::AwsTaggingDiscovery;
pub use discovery::{DiscoveryError, ResourceDiscovery};
pub use static_file::StaticResourceDiscovery;
