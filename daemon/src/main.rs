//! fsized - file size reporting daemon
//!
//! Long-running service that listens on a Unix socket and answers every
//! connection with a single line: the current byte size of one configured
//! file, or `ERROR: <reason>` if it cannot be stat'd.
//!
//! Architecture:
//! - Unix socket listener at the configured `socket_path`
//! - one reply per connection, served strictly in arrival order
//! - cooperative shutdown on SIGINT/SIGTERM
//! - optional double-fork detach for unattended operation

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fsize_core::config::{Config, DEFAULT_CONFIG_FILE};

mod detach;
mod handler;
mod server;
mod signals;

#[derive(Parser)]
#[command(name = "fsized")]
#[command(about = "Reports the size of a configured file over a Unix socket")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Detach from the terminal and run in the background
    #[arg(short, long)]
    detach: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Config problems must reach the operator's terminal, so the file is
    // loaded and validated before any detach.
    let config = Config::load(&args.config)?;

    let mut detach_warnings = Vec::new();
    if args.detach {
        detach_warnings = detach::detach().context("failed to detach from terminal")?;
    }

    init_logging(&config, args.detach)?;

    info!("Starting fsized v{}", env!("CARGO_PKG_VERSION"));
    for warning in &detach_warnings {
        error!("{}", warning);
    }

    // Forking has already happened, so the runtime is built here rather
    // than with a main macro. Connections are served one at a time; a
    // single-threaded runtime is all the workload needs.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let result = runtime.block_on(async {
        let shutdown = Arc::new(signals::Shutdown::new());
        signals::install(Arc::clone(&shutdown))?;
        server::run(&config, &shutdown).await
    });

    // Stderr points at /dev/null once detached, so fatal errors must also
    // go through the log sink before the process exits.
    if let Err(e) = &result {
        error!("Fatal: {:#}", e);
    }
    result
}

/// Initialize the logging sink.
///
/// Foreground runs log to stderr. Detached runs (or a configured
/// `log_file`) log to a file, since the standard streams point at
/// /dev/null after the detach.
fn init_logging(config: &Config, detached: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("fsized=info".parse()?);

    if detached || config.log_file.is_some() {
        let log_path = config.log_file.clone().unwrap_or_else(default_log_file);
        let directory = match log_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => std::path::Path::new("."),
        };
        let file_name = log_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("fsized.log"));
        std::fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(tracing_appender::rolling::never(directory, file_name))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn default_log_file() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".fsized"))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("fsized.log")
}
