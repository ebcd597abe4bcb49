//! Per-connection request handling
//!
//! A connection carries no payload; connecting is the request. The handler
//! answers with a single line and closes the connection. It has no error
//! return: every failure mode becomes an `ERROR:` reply line, so nothing a
//! client does can take down the accept loop.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::{debug, warn};

/// Answer one client on an accepted connection.
pub async fn handle(mut stream: UnixStream, file_path: &Path) {
    let reply = match tokio::fs::metadata(file_path).await {
        Ok(meta) => {
            debug!("Sent file size {} for {}", meta.len(), file_path.display());
            format!("{}\n", meta.len())
        }
        Err(e) => {
            warn!("Failed to get file size for {}: {}", file_path.display(), e);
            format!("ERROR: {e}\n")
        }
    };

    // A partial or failed write is not retried; the client has gone away.
    if let Err(e) = stream.write_all(reply.as_bytes()).await {
        warn!("Failed to write reply: {}", e);
    }
    let _ = stream.shutdown().await;
}
