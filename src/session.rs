//! Per-client session lifecycle
//!
//! One task per accepted socket walks the client through greeting,
//! naming, active chat, and teardown. The session owns the read half;
//! the shared `Connection` owns the write half. Room-wide traffic is
//! enqueued for the broadcaster; only the greeting, roster, and
//! farewell are written directly to this client.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::ChatError;
use crate::message::{self, OutboundMessage};
use crate::server::ServerState;

/// Why an active session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    /// The client sent the disconnect keyword.
    Quit,
    /// The client closed its end of the socket.
    Eof,
    /// Reading from the socket failed.
    ReadError,
    /// The broadcaster or server asked this connection to close.
    CloseRequested,
    /// The outbound queue shut down underneath us.
    QueueClosed,
}

/// Drive one client connection from accept to close.
///
/// Errors escape only before the client is registered; after that,
/// every exit runs the same teardown so the registry entry and the
/// departure announcement can never be missed or doubled.
pub async fn handle_session(stream: TcpStream, state: Arc<ServerState>) -> Result<(), ChatError> {
    let peer = state.peer_label(&stream);
    debug!(%peer, "new connection");

    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let conn = Arc::new(Connection::new(peer.clone(), write_half));

    // Greet before anything else. A failure here means the client is
    // already gone and nothing needs cleaning up.
    for line in message::WELCOME_BANNER.lines() {
        conn.send_line(line).await?;
    }
    conn.send_line(message::NAME_PROMPT).await?;

    // The first line names the client. A blank name gets a generated one.
    let username = match lines.next_line().await {
        Ok(Some(line)) => match line.trim() {
            "" => state.next_guest_name(),
            name => name.to_string(),
        },
        Ok(None) => {
            debug!(%peer, "connection closed before naming");
            return Ok(());
        }
        Err(err) => {
            warn!(%peer, error = %err, "read failed before naming");
            return Ok(());
        }
    };

    state
        .registry()
        .register(Arc::clone(&conn), username.clone())
        .await?;
    info!(%username, %peer, "client joined");

    let announced = state
        .queue()
        .send(OutboundMessage::joined(conn.id(), &username))
        .await;
    let reason = match announced {
        Ok(()) => {
            send_roster(&state, &conn).await;
            chat_loop(&state, &conn, &username, &mut lines).await
        }
        Err(_) => CloseReason::QueueClosed,
    };

    close_session(&state, &conn, &username, reason).await;
    Ok(())
}

/// Tell the newcomer who is already here, one line per client.
///
/// Best effort: if the write fails the read side will notice the dead
/// socket and tear the session down normally.
async fn send_roster(state: &ServerState, conn: &Connection) {
    for entry in state.registry().snapshot().await {
        if entry.conn.id() == conn.id() {
            continue;
        }
        if let Err(err) = conn.send_line(&message::roster_line(&entry.username)).await {
            warn!(peer = %conn.peer(), error = %err, "roster write failed");
            return;
        }
    }
}

/// Relay lines until the client leaves or is asked to close.
async fn chat_loop(
    state: &ServerState,
    conn: &Arc<Connection>,
    username: &str,
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
) -> CloseReason {
    loop {
        tokio::select! {
            () = conn.closed() => {
                debug!(peer = %conn.peer(), "close requested");
                return CloseReason::CloseRequested;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if message::is_disconnect(&line) {
                        return CloseReason::Quit;
                    }
                    debug!(%username, "relaying message");
                    let sent = state
                        .queue()
                        .send(OutboundMessage::chat(conn.id(), username, &line))
                        .await;
                    if sent.is_err() {
                        return CloseReason::QueueClosed;
                    }
                }
                Ok(None) => return CloseReason::Eof,
                Err(err) => {
                    warn!(peer = %conn.peer(), error = %err, "read failed");
                    return CloseReason::ReadError;
                }
            },
        }
    }
}

/// Single teardown path for a registered client.
///
/// Announces the departure only when this call actually removed the
/// entry, so a departure can never be doubled.
async fn close_session(
    state: &ServerState,
    conn: &Arc<Connection>,
    username: &str,
    reason: CloseReason,
) {
    if reason == CloseReason::Quit {
        // Best effort; the client may already be gone.
        let _ = conn.send_line(message::GOODBYE).await;
    }

    let removed = state.registry().deregister(conn.id()).await;

    if removed.is_some() && reason != CloseReason::QueueClosed {
        let announced = state
            .queue()
            .send(OutboundMessage::left(conn.id(), username))
            .await;
        if announced.is_err() {
            debug!(%username, "departure announcement dropped, queue closed");
        }
    }

    conn.shutdown().await;
    info!(%username, peer = %conn.peer(), ?reason, "client left");
}
