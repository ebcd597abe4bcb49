//! Configuration loading for the daemon
//!
//! The config file is TOML with two required string keys, `file_path` and
//! `socket_path`, and an optional `log_file` used when the daemon runs
//! detached:
//!
//! ```toml
//! file_path = "/var/log/syslog"
//! socket_path = "/tmp/fsized.sock"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Conventional config file name, looked up in the current directory when
/// no `-c` argument is given.
pub const DEFAULT_CONFIG_FILE: &str = "fsized.toml";

/// Validated daemon configuration.
///
/// Immutable once loaded; the daemon reads it for its entire lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// File whose size is reported to clients.
    pub file_path: PathBuf,
    /// Unix socket path the daemon listens on.
    pub socket_path: PathBuf,
    /// Log destination for detached mode.
    pub log_file: Option<PathBuf>,
}

/// Raw deserialization target. Required keys are validated explicitly so a
/// missing key reports as [`ConfigError::MissingKey`] rather than a generic
/// parse error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    file_path: Option<PathBuf>,
    socket_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// The file is read and parsed exactly once; any failure is fatal to
    /// daemon startup and never retried.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is missing, unreadable,
    /// malformed, or lacks a required key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::NotReadable {
                path: path.to_path_buf(),
                source,
            })?;

        let raw: RawConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            file_path: required(raw.file_path, "file_path")?,
            socket_path: required(raw.socket_path, "socket_path")?,
            log_file: raw.log_file,
        })
    }
}

fn required(value: Option<PathBuf>, key: &'static str) -> Result<PathBuf, ConfigError> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => Err(ConfigError::MissingKey(key)),
    }
}
