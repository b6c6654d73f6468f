//! Error types for probe execution and configuration.
//!
//! `ProbeError` covers anything that goes wrong while a probe is running. The
//! engine never lets it escape: it becomes a failed outcome carrying the
//! error's message. `ConfigError` covers invalid construction arguments and
//! unreadable config files, and is fatal at startup.

use std::io;

/// A failure raised while a probe performs its check.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    Ping(#[from] surge_ping::SurgeError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Could not resolve host: {0}")]
    Resolve(String),

    /// Free-form failure, used by delegate probes.
    #[error("{0}")]
    Failed(String),
}

impl ProbeError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProbeError::Failed(message.into())
    }
}

/// Invalid configuration, detected before any check runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid health check name: must not be empty")]
    EmptyName,

    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Configuration error: {0}")]
    Validation(String),
}
