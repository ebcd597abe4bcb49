//! IPC client for querying a running fsized daemon
//!
//! The protocol is deliberately minimal: connecting to the socket is the
//! request. The daemon writes back exactly one line, either the decimal
//! byte size of the monitored file or `ERROR: <reason>`, and closes the
//! connection. This module provides a synchronous client for that exchange,
//! usable from the CLI and from tests.

use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error type for IPC operations.
#[derive(Error, Debug)]
pub enum IpcError {
    /// Daemon is not running (socket doesn't exist or connection refused).
    #[error("daemon not running")]
    ServerNotRunning,

    /// Socket connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(std::io::Error),

    /// Failed to receive the reply line.
    #[error("failed to read reply: {0}")]
    ReceiveFailed(std::io::Error),

    /// Reply was neither a decimal size nor an `ERROR:` line.
    #[error("invalid reply from daemon: {0:?}")]
    InvalidReply(String),

    /// The daemon reported a failure to stat the monitored file.
    #[error("daemon error: {0}")]
    Server(String),
}

/// Client for one-shot size queries against the daemon socket.
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Create a client for the given socket path with a default timeout.
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(5),
        }
    }

    /// Set the read timeout for the exchange.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the daemon appears to be running (socket exists).
    pub fn server_available(&self) -> bool {
        self.socket_path.exists()
    }

    /// Query the daemon for the monitored file's size in bytes.
    ///
    /// # Errors
    /// Returns [`IpcError`] if the daemon is unreachable, the reply is
    /// malformed, or the daemon itself reported an `ERROR:` line.
    pub fn query_size(&self) -> Result<u64, IpcError> {
        // Check if socket exists first (fast path)
        if !self.socket_path.exists() {
            return Err(IpcError::ServerNotRunning);
        }

        let stream = UnixStream::connect(&self.socket_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::ConnectionRefused
                || e.kind() == std::io::ErrorKind::NotFound
            {
                IpcError::ServerNotRunning
            } else {
                IpcError::ConnectionFailed(e)
            }
        })?;

        stream.set_read_timeout(Some(self.timeout)).ok();

        // The connection itself is the request; just read the reply line.
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(IpcError::ReceiveFailed)?;

        parse_reply(&line)
    }
}

/// Parse a single reply line from the daemon.
fn parse_reply(line: &str) -> Result<u64, IpcError> {
    let line = line.trim_end_matches('\n');

    if let Some(reason) = line.strip_prefix("ERROR: ") {
        return Err(IpcError::Server(reason.to_string()));
    }

    line.parse::<u64>()
        .map_err(|_| IpcError::InvalidReply(line.to_string()))
}
