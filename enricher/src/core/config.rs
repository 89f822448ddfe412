//! Enricher configuration
//!
//! Values come from CLI flags with environment fallbacks (see `cli`). Invalid
//! values never abort: each one is logged and replaced by its default.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_CONTINUE_ON_EXPORT_FAILURE, DEFAULT_CONTINUE_ON_RESOURCE_FAILURE,
    DEFAULT_FILE_CACHE_ENABLED, DEFAULT_FILE_CACHE_EXPIRATION_SECS, DEFAULT_FILE_CACHE_PATH,
    DEFAULT_LABELS_SNAKE_CASE, ENV_EXPORTED_TAGS, ENV_FILE_CACHE_EXPIRATION, ENV_STATIC_LABELS,
    ENV_YACE_COMPAT_STATS,
};
use crate::domain::enrich::{EnrichOptions, LabelOptions, StatisticSelection};

/// Errors parsing a configuration value
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Static labels contain an empty string")]
    EmptyStaticLabel,

    #[error("Static label '{0}' is not a key=value pair")]
    MalformedStaticLabel(String),

    #[error("Invalid duration '{value}': {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}

/// Resource cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_FILE_CACHE_ENABLED,
            path: PathBuf::from(DEFAULT_FILE_CACHE_PATH),
            ttl: Duration::from_secs(DEFAULT_FILE_CACHE_EXPIRATION_SECS),
        }
    }
}

/// Resolved enricher configuration
#[derive(Debug, Clone)]
pub struct EnricherConfig {
    pub expand_statistics: bool,
    pub statistics: StatisticSelection,
    pub static_labels: BTreeMap<String, String>,
    pub exported_tags: Vec<String>,
    pub default_labels: bool,
    pub labels_snake_case: bool,
    pub cache: CacheConfig,
    pub continue_on_resource_failure: bool,
    pub continue_on_export_failure: bool,
    pub region: Option<String>,
    pub resources_file: Option<PathBuf>,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            expand_statistics: false,
            statistics: StatisticSelection::default(),
            static_labels: BTreeMap::new(),
            exported_tags: Vec::new(),
            default_labels: false,
            labels_snake_case: DEFAULT_LABELS_SNAKE_CASE,
            cache: CacheConfig::default(),
            continue_on_resource_failure: DEFAULT_CONTINUE_ON_RESOURCE_FAILURE,
            continue_on_export_failure: DEFAULT_CONTINUE_ON_EXPORT_FAILURE,
            region: None,
            resources_file: None,
        }
    }
}

impl EnricherConfig {
    /// Resolve configuration from CLI/env values
    pub fn load(cli: &CliConfig) -> Self {
        tracing::debug!("Loading enricher configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let statistics = parse_statistics(cli.yace_compat_stats.as_deref()).unwrap_or_else(|e| {
            tracing::error!(key = ENV_YACE_COMPAT_STATS, error = %e, "Failed to parse statistics, using defaults");
            StatisticSelection::default()
        });
        let static_labels = parse_static_labels(cli.static_labels.as_deref()).unwrap_or_else(|e| {
            tracing::error!(key = ENV_STATIC_LABELS, error = %e, "Failed to parse static labels");
            BTreeMap::new()
        });
        let exported_tags = parse_exported_tags(cli.exported_tags.as_deref()).unwrap_or_else(|e| {
            tracing::error!(key = ENV_EXPORTED_TAGS, error = %e, "Failed to parse exported tags, exporting all");
            Vec::new()
        });

        let default_ttl = Duration::from_secs(DEFAULT_FILE_CACHE_EXPIRATION_SECS);
        let ttl = parse_duration(cli.file_cache_expiration.as_deref(), default_ttl)
            .unwrap_or_else(|e| {
                tracing::error!(key = ENV_FILE_CACHE_EXPIRATION, error = %e, "Failed to parse duration value, using default");
                default_ttl
            });

        let config = Self {
            expand_statistics: parse_bool(cli.yace_compat_mode.as_deref(), false),
            statistics,
            static_labels,
            exported_tags,
            default_labels: parse_bool(cli.default_labels.as_deref(), false),
            labels_snake_case: parse_bool(
                cli.labels_snake_case.as_deref(),
                DEFAULT_LABELS_SNAKE_CASE,
            ),
            cache: CacheConfig {
                enabled: parse_bool(
                    cli.file_cache_enabled.as_deref(),
                    DEFAULT_FILE_CACHE_ENABLED,
                ),
                path: non_empty(cli.file_cache_path.as_deref())
                    .map_or_else(|| PathBuf::from(DEFAULT_FILE_CACHE_PATH), PathBuf::from),
                ttl,
            },
            continue_on_resource_failure: parse_bool(
                cli.continue_on_resource_failure.as_deref(),
                DEFAULT_CONTINUE_ON_RESOURCE_FAILURE,
            ),
            continue_on_export_failure: parse_bool(
                cli.continue_on_export_failure.as_deref(),
                DEFAULT_CONTINUE_ON_EXPORT_FAILURE,
            ),
            region: non_empty(cli.region.as_deref()).map(String::from),
            resources_file: cli.resources_file.clone(),
        };

        tracing::debug!(
            expand_statistics = config.expand_statistics,
            statistics = config.statistics.len(),
            static_labels = config.static_labels.len(),
            exported_tags = config.exported_tags.len(),
            cache_enabled = config.cache.enabled,
            cache_ttl = %humantime::format_duration(config.cache.ttl),
            region = config.region.as_deref().unwrap_or(""),
            "Configuration loaded"
        );

        config
    }

    /// Options for the enrichment pipeline
    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            expand_statistics: self.expand_statistics,
            statistics: self.statistics.clone(),
            labels: LabelOptions {
                exported_tags: self.exported_tags.clone(),
                static_labels: self.static_labels.clone(),
                default_labels: self.default_labels,
                snake_case: self.labels_snake_case,
            },
            continue_on_resource_failure: self.continue_on_resource_failure,
            default_region: self.region.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Unset or empty gives `default`; otherwise only `true` (any case) is true
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match non_empty(value) {
        Some(v) => v.eq_ignore_ascii_case("true"),
        None => default,
    }
}

/// Unset or empty gives `default`. Accepts humantime syntax (`1h 30m`) and
/// fractional unit values (`1.5h`, `0.5m`).
pub fn parse_duration(value: Option<&str>, default: Duration) -> Result<Duration, ConfigError> {
    let Some(v) = non_empty(value) else {
        return Ok(default);
    };
    humantime::parse_duration(v).or_else(|source| {
        parse_fractional_duration(v).ok_or_else(|| ConfigError::InvalidDuration {
            value: v.to_string(),
            source,
        })
    })
}

/// Sequence of `<decimal><unit>` terms with units `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`
fn parse_fractional_duration(value: &str) -> Option<Duration> {
    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = value.trim();
    let mut secs = 0.0_f64;
    while !rest.is_empty() {
        let (number, tail) = rest.split_at(rest.find(|c: char| !is_number(c))?);
        let (unit, tail) = tail.split_at(tail.find(is_number).unwrap_or(tail.len()));
        let scale = match unit {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        secs += number.parse::<f64>().ok()? * scale;
        rest = tail;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// JSON array of statistic names; unset or empty gives the default selection
pub fn parse_statistics(value: Option<&str>) -> Result<StatisticSelection, ConfigError> {
    match non_empty(value) {
        Some(v) => {
            let names: Vec<String> = serde_json::from_str(v)?;
            Ok(StatisticSelection::new(names))
        }
        None => Ok(StatisticSelection::default()),
    }
}

/// JSON array of `key=value` strings. The key ends at the first `=`.
pub fn parse_static_labels(value: Option<&str>) -> Result<BTreeMap<String, String>, ConfigError> {
    let Some(v) = non_empty(value) else {
        return Ok(BTreeMap::new());
    };

    let raw: Vec<String> = serde_json::from_str(v)?;
    let mut labels = BTreeMap::new();
    for label in raw {
        if label.is_empty() {
            return Err(ConfigError::EmptyStaticLabel);
        }
        let Some((key, value)) = label.split_once('=') else {
            return Err(ConfigError::MalformedStaticLabel(label));
        };
        labels.insert(key.to_string(), value.to_string());
    }
    Ok(labels)
}

/// JSON array of tag keys; unset or empty exports every tag
pub fn parse_exported_tags(value: Option<&str>) -> Result<Vec<String>, ConfigError> {
    match non_empty(value) {
        Some(v) => Ok(serde_json::from_str(v)?),
        None => Ok(Vec::new()),
    }
}
