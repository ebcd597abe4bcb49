//! Error types for fsize

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the daemon configuration.
///
/// Every variant is fatal at startup; none of them is retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path} does not exist")]
    NotFound { path: PathBuf },

    #[error("config file {path} is not readable: {source}")]
    NotReadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("required key `{0}` missing or empty in config")]
    MissingKey(&'static str),
}
