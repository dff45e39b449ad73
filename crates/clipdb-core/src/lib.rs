//! Shared domain types and configuration for clipdb.

pub mod account;
pub mod app_config;
pub mod config;
pub mod planning;
pub mod publications;

use thiserror::Error;

pub use account::NewAccountMetrics;
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use planning::{ContentStatus, InvalidStatus};
pub use publications::{engagement_rate, MetricSnapshot, Publication, PublicationWithLatest};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
