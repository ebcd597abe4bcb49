//! fsize CLI
//!
//! Thin client that asks a running fsized daemon for the monitored file's
//! size and prints it. The socket is taken from the daemon's config file,
//! or given directly with --socket.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use fsize_core::config::{Config, DEFAULT_CONFIG_FILE};
use fsize_core::ipc::{IpcClient, IpcError};

#[derive(Parser)]
#[command(name = "fsize")]
#[command(about = "Query the file size reported by a running fsized daemon")]
#[command(version)]
struct Cli {
    /// Configuration file used to locate the daemon socket
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Daemon socket path, overriding the configuration file
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Reply timeout in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket_path = match cli.socket {
        Some(path) => path,
        None => {
            let config = Config::load(&cli.config).with_context(|| {
                format!("failed to load config file {}", cli.config.display())
            })?;
            config.socket_path
        }
    };

    let client = IpcClient::new(socket_path).with_timeout(Duration::from_secs(cli.timeout));

    match client.query_size() {
        Ok(size) => println!("{size}"),
        Err(IpcError::ServerNotRunning) => {
            eprintln!("Failed to communicate with daemon: daemon not running");
            eprintln!("Is the daemon running? Try: fsized -c <config>");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to communicate with daemon: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
