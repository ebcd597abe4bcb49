//! Shutdown flag and signal wiring
//!
//! SIGINT and SIGTERM request a graceful stop. The watcher's only work on
//! delivery is flipping the running flag and waking the accept loop; all
//! real shutdown work happens at the loop boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;

/// Cooperative shutdown handle shared between the signal watcher and the
/// accept loop. The flag is the only mutable state touched from outside
/// the serving loop.
pub struct Shutdown {
    running: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            notify: Notify::new(),
        }
    }

    /// Check whether the server should keep accepting connections.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request a graceful shutdown. Idempotent; repeated requests have no
    /// additional effect.
    pub fn request(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Wait until a shutdown has been requested.
    pub async fn requested(&self) {
        if !self.is_running() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Install watchers for SIGINT and SIGTERM.
///
/// Must be called from within the runtime. The watcher loops forever so a
/// second signal is observed and discarded instead of killing the process.
pub fn install(shutdown: Arc<Shutdown>) -> Result<()> {
    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interrupt.recv() => {}
                _ = terminate.recv() => {}
            }
            shutdown.request();
        }
    });

    Ok(())
}
