//! Shared types and configuration for mailtrace.
//!
//! Holds the normalized profile model every source adapter produces, the
//! environment-driven [`AppConfig`], and provider credentials loaded from
//! `providers.yaml`.

pub mod app_config;
pub mod config;
pub mod profile;
pub mod providers;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use profile::{ProfileRecord, ResolutionResult, ServiceMention};
pub use providers::{load_providers, Credentials, ProviderCredentials, ProvidersFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read providers file {path}: {source}")]
    ProvidersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse providers file: {0}")]
    ProvidersFileParse(#[from] serde_yaml::Error),

    #[error("providers validation failed: {0}")]
    Validation(String),
}
