//! TTL cache of tagged resources per namespace
//!
//! Lookup order for a namespace:
//! 1. in-memory entry, if fresh
//! 2. persisted entry, if present, fresh by its storage timestamp, and parseable
//! 3. fresh fetch from resource discovery, persisted and kept in memory
//!
//! Without storage only step 2 and the persist are skipped; fetched resources
//! are still reused for the life of the cache. Expiry is checked lazily on
//! access. A persisted entry that cannot be read or parsed is treated as
//! absent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::error::CacheError;
use crate::data::resources::{DiscoveryError, ResourceDiscovery};
use crate::data::storage::CacheStorage;
use crate::data::types::TaggedResource;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const CACHE_KEY_PREFIX: &str = "cache-";

/// Storage key of a namespace: `AWS/EC2` is stored as `cache-AWS-EC2`
pub fn cache_key(namespace: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, namespace.replace('/', "-"))
}

/// An entry fetched at `fetched_at` is stale once `ttl` has fully elapsed
pub fn is_stale(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    match TimeDelta::from_std(ttl) {
        Ok(ttl) => now - fetched_at >= ttl,
        // TTL beyond chrono's range never expires
        Err(_) => false,
    }
}

struct CacheEntry {
    resources: Vec<TaggedResource>,
    fetched_at: DateTime<Utc>,
}

/// Resource tag cache owned by one enrichment run
pub struct ResourceTagCache {
    discovery: Arc<dyn ResourceDiscovery>,
    /// `None` disables persistence
    storage: Option<Arc<dyn CacheStorage>>,
    ttl: Duration,
    clock: Clock,
    entries: HashMap<String, CacheEntry>,
}

impl ResourceTagCache {
    pub fn new(
        discovery: Arc<dyn ResourceDiscovery>,
        storage: Option<Arc<dyn CacheStorage>>,
        ttl: Duration,
    ) -> Self {
        Self {
            discovery,
            storage,
            ttl,
            clock: Arc::new(Utc::now),
            entries: HashMap::new(),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.storage.is_some()
    }

    /// Resources of `namespace`, refreshing from discovery when missing or stale.
    ///
    /// "No resources" from discovery yields an empty slice; any other discovery
    /// failure is returned as `CacheError::Discovery`.
    pub async fn get(
        &mut self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<&[TaggedResource], CacheError> {
        let now = (self.clock)();
        let fresh = self
            .entries
            .get(namespace)
            .is_some_and(|e| !is_stale(e.fetched_at, now, self.ttl));

        if !fresh {
            let entry = self.refresh(namespace, region, now).await?;
            self.entries.insert(namespace.to_string(), entry);
        }

        Ok(self
            .entries
            .get(namespace)
            .map(|e| e.resources.as_slice())
            .unwrap_or_default())
    }

    async fn refresh(
        &self,
        namespace: &str,
        region: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, CacheError> {
        let Some(storage) = self.storage.as_deref() else {
            let resources = self.fetch(namespace, region).await?;
            return Ok(CacheEntry {
                resources,
                fetched_at: now,
            });
        };

        let key = cache_key(namespace);
        if let Some(entry) = self.load(storage, &key, namespace, now).await {
            tracing::debug!(
                namespace,
                count = entry.resources.len(),
                "Loaded resources from cache"
            );
            return Ok(entry);
        }

        tracing::debug!(namespace, "Refreshing resource cache");
        let resources = self.fetch(namespace, region).await?;
        let fetched_at = (self.clock)();
        self.persist(storage, &key, namespace, &resources).await;

        Ok(CacheEntry {
            resources,
            fetched_at,
        })
    }

    /// Load a persisted entry; `None` when absent, stale, unreadable or corrupt
    async fn load(
        &self,
        storage: &dyn CacheStorage,
        key: &str,
        namespace: &str,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry> {
        match storage.exists(key).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "Failed to check resource cache");
                return None;
            }
        }

        let fetched_at = match storage.modified(key).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "Failed to stat resource cache");
                return None;
            }
        };
        if is_stale(fetched_at, now, self.ttl) {
            tracing::debug!(namespace, fetched_at = %fetched_at, "Resource cache expired");
            return None;
        }

        let data = match storage.read(key).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "Failed to read resource cache");
                return None;
            }
        };

        // Entries written for namespaces without resources may hold `null`
        match serde_json::from_slice::<Option<Vec<TaggedResource>>>(&data) {
            Ok(resources) => Some(CacheEntry {
                resources: resources.unwrap_or_default(),
                fetched_at,
            }),
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "Corrupt resource cache entry, refreshing");
                None
            }
        }
    }

    async fn persist(
        &self,
        storage: &dyn CacheStorage,
        key: &str,
        namespace: &str,
        resources: &[TaggedResource],
    ) {
        let data = match serde_json::to_vec(resources) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(namespace, error = %e, "Failed to serialize resources");
                return;
            }
        };
        if let Err(e) = storage.write(key, &data).await {
            tracing::warn!(
                namespace,
                key,
                backend = storage.backend_name(),
                error = %e,
                "Failed to persist resource cache"
            );
        }
    }

    async fn fetch(
        &self,
        namespace: &str,
        region: Option<&str>,
    ) -> Result<Vec<TaggedResource>, CacheError> {
        match self.discovery.fetch(namespace, region).await {
            Ok(resources) => Ok(resources),
            Err(DiscoveryError::NoResources { .. }) => {
                tracing::debug!(namespace, "No tagged resources for namespace");
                Ok(Vec::new())
            }
            Err(source) => Err(CacheError::Discovery {
                namespace: namespace.to_string(),
                source,
            }),
        }
    }
}
