//! Connection handle
//!
//! One `Connection` per accepted TCP stream. The session task owns the
//! read half; the write half lives here behind an async mutex so the
//! session and the broadcaster can both write without interleaving
//! mid-line. Registry membership, not this handle, decides broadcast
//! eligibility.

use std::io;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, Notify};

use crate::types::ConnId;

/// Shared handle to the writable side of one client connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnId,
    peer: String,
    writer: Mutex<OwnedWriteHalf>,
    close_requested: Notify,
}

impl Connection {
    /// Wrap the write half of an accepted stream.
    ///
    /// `peer` is the display label for this connection: the remote
    /// address, or `[REDACTED]` under safe mode.
    pub fn new(peer: String, writer: OwnedWriteHalf) -> Self {
        Self {
            id: ConnId::new(),
            peer,
            writer: Mutex::new(writer),
            close_requested: Notify::new(),
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Display label of the remote end (possibly redacted).
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Write one protocol line, newline-terminated, and flush.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }

    /// Ask the owning session to close this connection.
    ///
    /// Used by the broadcaster after a failed write. The session
    /// observes it via [`closed`](Self::closed) and runs its normal
    /// closing sequence; deregistration stays with the session.
    pub fn request_close(&self) {
        self.close_requested.notify_one();
    }

    /// Resolves once a close has been requested.
    pub async fn closed(&self) {
        self.close_requested.notified().await;
    }

    /// Flush and shut down the write half. Best-effort: the peer may
    /// already be gone.
    pub async fn shutdown(&self) {
        let _ = self.writer.lock().await.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    use super::*;

    async fn connected_pair() -> (Connection, BufReader<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        let (_, writer) = stream.into_split();
        (
            Connection::new(addr.to_string(), writer),
            BufReader::new(client),
        )
    }

    #[tokio::test]
    async fn test_send_line_terminates_with_newline() {
        let (conn, mut peer) = connected_pair().await;

        conn.send_line("hello").await.unwrap();

        let mut line = String::new();
        peer.read_line(&mut line).await.unwrap();
        assert_eq!(line, "hello\n");
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let (conn, _peer) = connected_pair().await;

        conn.shutdown().await;

        assert!(conn.send_line("too late").await.is_err());
    }

    #[tokio::test]
    async fn test_close_request_is_observed() {
        let (conn, _peer) = connected_pair().await;

        // The permit is stored, so requesting before waiting works too.
        conn.request_close();

        timeout(Duration::from_secs(1), conn.closed())
            .await
            .expect("close request should resolve the waiter");
    }

    #[tokio::test]
    async fn test_peer_label_is_kept() {
        let (conn, _peer) = connected_pair().await;
        assert!(conn.peer().starts_with("127.0.0.1:"));
    }
}
