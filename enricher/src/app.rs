//! Core application

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::cli::{self, Commands};
use crate::core::config::EnricherConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
use crate::data::cache::ResourceTagCache;
use crate::data::resources::{AwsTaggingDiscovery, ResourceDiscovery, StaticResourceDiscovery};
use crate::data::storage::{CacheStorage, FilesystemStorage};
use crate::domain::enrich::{EnrichError, Enricher, ServiceCatalog};

pub struct CoreApp {
    pub config: EnricherConfig,
    pub enricher: Enricher,
}

/// Outcome counts of one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub enriched: usize,
    pub passed_through: usize,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Commands::Namespaces => {
                Self::print_namespaces();
                Ok(())
            }
            Commands::Enrich { inputs, output_dir } => {
                let config = EnricherConfig::load(&cli_config);
                let mut app = Self::init(config).await?;
                let summary = app.enrich_files(&inputs, &output_dir).await?;
                tracing::info!(
                    enriched = summary.enriched,
                    passed_through = summary.passed_through,
                    output_dir = %output_dir.display(),
                    "Enrichment complete"
                );
                Ok(())
            }
        }
    }

    async fn init(config: EnricherConfig) -> Result<Self> {
        let catalog = ServiceCatalog::builtin();
        let discovery = Self::init_discovery(&config, &catalog).await?;

        let storage: Option<Arc<dyn CacheStorage>> = if config.cache.enabled {
            let storage = FilesystemStorage::new(&config.cache.path);
            tracing::debug!(
                backend = storage.backend_name(),
                path = %storage.base_path().display(),
                "Resource cache initialized"
            );
            Some(Arc::new(storage))
        } else {
            tracing::debug!("Resource cache persistence disabled");
            None
        };

        let cache = ResourceTagCache::new(discovery, storage, config.cache.ttl);
        let enricher = Enricher::new(cache, Arc::new(catalog), config.enrich_options());

        Ok(Self { config, enricher })
    }

    /// Resources file when configured, otherwise the AWS tagging API
    async fn init_discovery(
        config: &EnricherConfig,
        catalog: &ServiceCatalog,
    ) -> Result<Arc<dyn ResourceDiscovery>> {
        if let Some(path) = config.resources_file.as_deref() {
            let discovery = StaticResourceDiscovery::from_file(path)
                .await
                .with_context(|| format!("Failed to load resources from {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Using resource file discovery");
            return Ok(Arc::new(discovery));
        }

        let discovery =
            AwsTaggingDiscovery::new(config.region.clone(), catalog.resource_filters()).await;
        tracing::debug!("Using AWS tagging API discovery");
        Ok(Arc::new(discovery))
    }

    /// Enrich each input file as one record, writing results under `output_dir`
    pub async fn enrich_files(
        &mut self,
        inputs: &[PathBuf],
        output_dir: &Path,
    ) -> Result<RunSummary> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let mut summary = RunSummary::default();
        for input in inputs {
            let file_name = input
                .file_name()
                .with_context(|| format!("Not a file path: {}", input.display()))?;
            let data = tokio::fs::read(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let output = match self.enricher.enrich_record(&data).await {
                Ok(output) => {
                    summary.enriched += 1;
                    output
                }
                Err(EnrichError::Codec(e)) if self.config.continue_on_export_failure => {
                    tracing::error!(file = %input.display(), error = %e, "Failed to decode record data, passing through");
                    summary.passed_through += 1;
                    data
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to enrich {}", input.display()));
                }
            };

            let target = output_dir.join(file_name);
            tokio::fs::write(&target, &output)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
            tracing::debug!(
                input = %input.display(),
                output = %target.display(),
                size = output.len(),
                "Record written"
            );
        }

        Ok(summary)
    }

    fn print_namespaces() {
        let catalog = ServiceCatalog::builtin();
        let mut namespaces: Vec<_> = catalog.namespaces().collect();
        namespaces.sort_unstable();
        for namespace in namespaces {
            println!("{}", namespace);
        }
    }

    fn init_logging() {
        let default_filter = match std::env::var(ENV_LOG_LEVEL) {
            Ok(level) if level.eq_ignore_ascii_case("debug") => {
                format!("info,{}=debug", APP_NAME_LOWER)
            }
            _ => format!("info,{}=info", APP_NAME_LOWER),
        };

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|f| f.eq_ignore_ascii_case("json"));

        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true);

        if json {
            builder.json().with_env_filter(filter).init();
        } else {
            builder.with_ansi(true).compact().with_env_filter(filter).init();
        }
    }
}
