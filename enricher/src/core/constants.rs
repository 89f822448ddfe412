// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for binaries and log filters)
pub const APP_NAME_LOWER: &str = "metric_stream_enricher";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "ENRICHER_LOG";

/// Environment variable for log output format (`compact` or `json`)
pub const ENV_LOG_FORMAT: &str = "ENRICHER_LOG_FORMAT";

/// Level-only fallback; `debug` enables debug logging
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

// =============================================================================
// Environment Variables - Enrichment
// =============================================================================

/// JSON array of statistics emitted in expansion mode
pub const ENV_YACE_COMPAT_STATS: &str = "YACE_COMPAT_STATS";

/// Replace summaries with per-statistic gauges
pub const ENV_YACE_COMPAT_MODE: &str = "YACE_COMPAT_MODE";

/// JSON array of `key=value` static labels
pub const ENV_STATIC_LABELS: &str = "STATIC_LABELS";

/// JSON array of tag keys exported as labels
pub const ENV_EXPORTED_TAGS: &str = "EXPORTED_TAGS_ON_METRICS";

/// Emit static labels on metrics without a matched resource
pub const ENV_DEFAULT_LABELS: &str = "DEFAULT_LABELS";

/// Snake-case label names
pub const ENV_LABELS_SNAKE_CASE: &str = "LABELS_SNAKE_CASE";

/// Skip data points whose resources cannot be fetched
pub const ENV_CONTINUE_ON_RESOURCE_FAILURE: &str = "CONTINUE_ON_RESOURCE_FAILURE";

/// Pass undecodable records through instead of failing the run
pub const ENV_CONTINUE_ON_EXPORT_FAILURE: &str = "CONTINUE_ON_EXPORT_FAILURE";

/// Default region
pub const ENV_REGION: &str = "AWS_REGION";

/// JSON file mapping namespaces to tagged resources
pub const ENV_RESOURCES_FILE: &str = "ENRICHER_RESOURCES_FILE";

// =============================================================================
// Environment Variables - Resource Cache
// =============================================================================

/// Enable the persisted resource cache
pub const ENV_FILE_CACHE_ENABLED: &str = "FILE_CACHE_ENABLED";

/// Cache TTL (`1h`, `30m`, ...)
pub const ENV_FILE_CACHE_EXPIRATION: &str = "FILE_CACHE_EXPIRATION";

/// Cache directory
pub const ENV_FILE_CACHE_PATH: &str = "FILE_CACHE_PATH";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_LABELS_SNAKE_CASE: bool = true;
pub const DEFAULT_FILE_CACHE_ENABLED: bool = true;
pub const DEFAULT_CONTINUE_ON_RESOURCE_FAILURE: bool = true;
pub const DEFAULT_CONTINUE_ON_EXPORT_FAILURE: bool = true;

/// Default cache TTL in seconds (1 hour)
pub const DEFAULT_FILE_CACHE_EXPIRATION_SECS: u64 = 3600;

/// Default cache directory
pub const DEFAULT_FILE_CACHE_PATH: &str = "/tmp";
