//! Resource tag cache
//!
//! Namespace-keyed cache of tagged resources with a fixed TTL, persisted to
//! durable storage between invocations.

mod error;
mod resource_cache;

pub use error::CacheError;
pub use resource_cache::{Clock, ResourceTagCache, cache_key, is_stale};
