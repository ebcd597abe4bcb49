//! Unix socket server for the daemon
//!
//! Owns the listening socket for the whole run: removes any stale node,
//! binds, serves connections strictly one at a time, and removes the node
//! again on shutdown.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::UnixListener;
use tracing::{error, info, warn};

use fsize_core::Config;

use crate::handler;
use crate::signals::Shutdown;

/// Run the accept loop until shutdown is requested.
///
/// # Errors
/// Returns an error only for the unrecoverable bind failures at startup;
/// once listening, accept failures are logged and survived.
pub async fn run(config: &Config, shutdown: &Shutdown) -> Result<()> {
    let socket_path = config.socket_path.as_path();

    // Remove a stale socket left over from a previous run. Absence is fine.
    if socket_path.exists() {
        std::fs::remove_file(socket_path).with_context(|| {
            format!("failed to remove stale socket {}", socket_path.display())
        })?;
    }

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("failed to bind socket {}", socket_path.display()))?;

    // Any local peer may connect; access control is not this layer's job.
    relax_permissions(socket_path);

    info!("Monitoring file: {}", config.file_path.display());
    info!("Listening on {}", socket_path.display());

    while shutdown.is_running() {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    // Served to completion before the next accept; strictly
                    // one at a time, in arrival order.
                    Ok((stream, _addr)) => handler::handle(stream, &config.file_path).await,
                    Err(e) => {
                        // Transient while running; expected during shutdown.
                        if shutdown.is_running() {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
            _ = shutdown.requested() => {
                info!("Shutdown requested, stopping server");
            }
        }
    }

    drop(listener);
    if socket_path.exists() {
        if let Err(e) = std::fs::remove_file(socket_path) {
            error!("Failed to remove socket {}: {}", socket_path.display(), e);
        }
    }
    info!("Server stopped");
    Ok(())
}

fn relax_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666)) {
        warn!("Failed to set permissions on {}: {}", path.display(), e);
    }
}
