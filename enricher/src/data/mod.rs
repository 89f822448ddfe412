//! Data layer
//!
//! - `types` - Tagged resources, tags and metric descriptors
//! - `resources` - Resource discovery trait and the JSON-file implementation
//! - `storage` - Durable key/value storage for cached resources
//! - `cache` - Namespace-keyed TTL cache of tagged resources

pub mod cache;
pub mod resources;
pub mod storage;
pub mod types;

pub use cache::{CacheError, ResourceTagCache};
pub use resources::{DiscoveryError, ResourceDiscovery, StaticResourceDiscovery};
pub use storage::{CacheStorage, FilesystemStorage, MemoryStorage, StorageError};
pub use types::{Dimension, MetricDescriptor, Tag, TaggedResource};
