//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{CacheConfig, ConfigError, EnricherConfig};
