use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONTINUE_ON_EXPORT_FAILURE, ENV_CONTINUE_ON_RESOURCE_FAILURE, ENV_DEFAULT_LABELS,
    ENV_EXPORTED_TAGS, ENV_FILE_CACHE_ENABLED, ENV_FILE_CACHE_EXPIRATION, ENV_FILE_CACHE_PATH,
    ENV_LABELS_SNAKE_CASE, ENV_REGION, ENV_RESOURCES_FILE, ENV_STATIC_LABELS,
    ENV_YACE_COMPAT_MODE, ENV_YACE_COMPAT_STATS,
};

#[derive(Parser)]
#[command(name = "metric-stream-enricher")]
#[command(
    version,
    about = "Enrich CloudWatch metric stream records with resource tags",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Statistics emitted in expansion mode, as a JSON array
    #[arg(long, global = true, env = ENV_YACE_COMPAT_STATS)]
    pub yace_compat_stats: Option<String>,

    /// Replace summaries with one gauge per statistic (true/false)
    #[arg(long, global = true, env = ENV_YACE_COMPAT_MODE)]
    pub yace_compat_mode: Option<String>,

    /// Static labels as a JSON array of "key=value" strings
    #[arg(long, global = true, env = ENV_STATIC_LABELS)]
    pub static_labels: Option<String>,

    /// Tag keys exported as labels, as a JSON array (default: all tags)
    #[arg(long, global = true, env = ENV_EXPORTED_TAGS)]
    pub exported_tags: Option<String>,

    /// Emit static labels on metrics without a matched resource (true/false)
    #[arg(long, global = true, env = ENV_DEFAULT_LABELS)]
    pub default_labels: Option<String>,

    /// Snake-case label names (true/false)
    #[arg(long, global = true, env = ENV_LABELS_SNAKE_CASE)]
    pub labels_snake_case: Option<String>,

    /// Persist fetched resources between runs (true/false)
    #[arg(long, global = true, env = ENV_FILE_CACHE_ENABLED)]
    pub file_cache_enabled: Option<String>,

    /// Resource cache TTL, e.g. "1h", "30m" or "1.5h"
    #[arg(long, global = true, env = ENV_FILE_CACHE_EXPIRATION)]
    pub file_cache_expiration: Option<String>,

    /// Resource cache directory
    #[arg(long, global = true, env = ENV_FILE_CACHE_PATH)]
    pub file_cache_path: Option<String>,

    /// Skip data points whose resources cannot be fetched (true/false)
    #[arg(long, global = true, env = ENV_CONTINUE_ON_RESOURCE_FAILURE)]
    pub continue_on_resource_failure: Option<String>,

    /// Pass undecodable records through unchanged (true/false)
    #[arg(long, global = true, env = ENV_CONTINUE_ON_EXPORT_FAILURE)]
    pub continue_on_export_failure: Option<String>,

    /// Region used when a record carries none
    #[arg(long, global = true, env = ENV_REGION)]
    pub region: Option<String>,

    /// JSON file mapping namespaces to tagged resources
    #[arg(long, global = true, env = ENV_RESOURCES_FILE)]
    pub resources_file: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Enrich metric stream record files
    Enrich {
        /// Record files, each holding length-delimited OTLP metric requests
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving the enriched records (same file names)
        #[arg(long, short = 'o')]
        output_dir: PathBuf,
    },
    /// List namespaces that can be enriched
    Namespaces,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub yace_compat_stats: Option<String>,
    pub yace_compat_mode: Option<String>,
    pub static_labels: Option<String>,
    pub exported_tags: Option<String>,
    pub default_labels: Option<String>,
    pub labels_snake_case: Option<String>,
    pub file_cache_enabled: Option<String>,
    pub file_cache_expiration: Option<String>,
    pub file_cache_path: Option<String>,
    pub continue_on_resource_failure: Option<String>,
    pub continue_on_export_failure: Option<String>,
    pub region: Option<String>,
    pub resources_file: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        yace_compat_stats: cli.yace_compat_stats,
        yace_compat_mode: cli.yace_compat_mode,
        static_labels: cli.static_labels,
        exported_tags: cli.exported_tags,
        default_labels: cli.default_labels,
        labels_snake_case: cli.labels_snake_case,
        file_cache_enabled: cli.file_cache_enabled,
        file_cache_expiration: cli.file_cache_expiration,
        file_cache_path: cli.file_cache_path,
        continue_on_resource_failure: cli.continue_on_resource_failure,
        continue_on_export_failure: cli.continue_on_export_failure,
        region: cli.region,
        resources_file: cli.resources_file,
    };
    (config, cli.command)
}
