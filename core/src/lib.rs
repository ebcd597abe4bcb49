//! fsize-core - Shared configuration and client types
//!
//! This crate provides:
//! - Configuration loading and validation for the daemon
//! - IPC client for querying a running daemon over its Unix socket
//! - Error types shared between the daemon and the CLI

pub mod config;
pub mod error;
pub mod ipc;

pub use config::Config;
pub use error::ConfigError;
pub use ipc::{IpcClient, IpcError};
