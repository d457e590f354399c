//! Server assembly and accept loop
//!
//! `ChatServer` wires the registry, the outbound queue, and the
//! fan-out task around a listening socket. Each accepted connection
//! gets its own session task; all shared handles travel through
//! `ServerState`, never through globals.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::broadcast::{outbound_queue, Broadcaster, OutboundQueue};
use crate::error::ChatError;
use crate::registry::Registry;
use crate::session;

/// Placeholder logged instead of a peer address when safe mode is on.
const REDACTED_ADDR: &str = "[REDACTED]";

/// Tunables for one server instance.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Keep peer addresses out of logs and diagnostics.
    pub safe_mode: bool,
    /// Bound for the outbound queue; `None` leaves it unbounded.
    pub queue_capacity: Option<usize>,
}

/// Shared handles a session needs: registry, queue, and tunables.
#[derive(Debug)]
pub struct ServerState {
    registry: Arc<Registry>,
    queue: OutboundQueue,
    safe_mode: bool,
    guest_seq: AtomicU64,
}

impl ServerState {
    fn new(registry: Arc<Registry>, queue: OutboundQueue, safe_mode: bool) -> Self {
        Self {
            registry,
            queue,
            safe_mode,
            guest_seq: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Peer address for logs, honoring safe mode.
    pub fn peer_label(&self, stream: &TcpStream) -> String {
        if self.safe_mode {
            return REDACTED_ADDR.to_string();
        }
        stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Display name for a client that offered a blank one.
    pub fn next_guest_name(&self) -> String {
        let n = self.guest_seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("guest-{n}")
    }
}

/// A chat server around an already-bound listener.
///
/// The caller binds the socket, which keeps tests on ephemeral ports
/// trivial and leaves bind failures at the edge of the program.
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    broadcaster: Broadcaster,
}

impl ChatServer {
    pub fn new(listener: TcpListener, config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let (queue, inbox) = outbound_queue(config.queue_capacity);
        let broadcaster = Broadcaster::new(Arc::clone(&registry), inbox);
        let state = Arc::new(ServerState::new(registry, queue, config.safe_mode));
        Self {
            listener,
            state,
            broadcaster,
        }
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Fresh producer handle, for announcements that originate on the
    /// server side rather than from a client.
    pub fn queue(&self) -> OutboundQueue {
        self.state.queue.clone()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Accept errors are logged and the loop keeps going; a transient
    /// failure must not take the whole server down.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            state,
            broadcaster,
        } = self;

        let fan_out = tokio::spawn(broadcaster.run());
        tokio::pin!(shutdown);

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => spawn_session(stream, &state),
                    Err(err) => warn!(error = %err, "failed to accept connection"),
                },
            }
        }

        // Queue producers can outlive the loop (the operator console
        // holds one for the life of the process, lingering sessions
        // hold them through `state`), so stop the fan-out task directly
        // instead of waiting for every handle to drop.
        drop(state);
        fan_out.abort();
        let _ = fan_out.await;
    }

    /// Run until the process receives ctrl-c.
    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to install ctrl-c handler");
            }
        })
        .await;
    }
}

fn spawn_session(stream: TcpStream, state: &Arc<ServerState>) {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        match session::handle_session(stream, state).await {
            Ok(()) => {}
            // A registry fault is a bug, not a bad peer.
            Err(err @ ChatError::Registry(_)) => error!(error = %err, "session aborted"),
            Err(err) => warn!(error = %err, "session ended with error"),
        }
    });
}
