//! Broadcast queue and fan-out task
//!
//! All outbound traffic funnels through one mpsc queue into a single
//! `Broadcaster` task — the serialization point that gives every client
//! the same message order. Per message the broadcaster snapshots the
//! registry and writes to every connection except the sender. A failed
//! recipient gets a close request and the pass continues; the
//! recipient's own session deregisters it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::message::OutboundMessage;
use crate::registry::Registry;

/// Producer handle for the outbound queue, cloned into every session
/// and the operator console.
#[derive(Debug, Clone)]
pub enum OutboundQueue {
    /// Operator-bounded queue: send awaits capacity when full, so a
    /// full queue backpressures producers instead of dropping.
    Bounded(mpsc::Sender<OutboundMessage>),
    /// Default: unbounded queue, send never waits.
    Unbounded(mpsc::UnboundedSender<OutboundMessage>),
}

impl OutboundQueue {
    /// Enqueue one message for fan-out.
    ///
    /// Errors only when the broadcaster is gone (server teardown).
    pub async fn send(&self, msg: OutboundMessage) -> Result<(), ChatError> {
        match self {
            Self::Bounded(tx) => tx.send(msg).await.map_err(|_| ChatError::QueueClosed),
            Self::Unbounded(tx) => tx.send(msg).map_err(|_| ChatError::QueueClosed),
        }
    }
}

/// Consumer half, owned by the broadcaster.
#[derive(Debug)]
pub enum OutboundReceiver {
    Bounded(mpsc::Receiver<OutboundMessage>),
    Unbounded(mpsc::UnboundedReceiver<OutboundMessage>),
}

impl OutboundReceiver {
    /// Next queued message; `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Create the outbound queue. `None` keeps it unbounded; `Some(n)`
/// bounds it at `n` in-flight messages.
pub fn outbound_queue(capacity: Option<usize>) -> (OutboundQueue, OutboundReceiver) {
    match capacity {
        Some(n) => {
            let (tx, rx) = mpsc::channel(n);
            (OutboundQueue::Bounded(tx), OutboundReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (OutboundQueue::Unbounded(tx), OutboundReceiver::Unbounded(rx))
        }
    }
}

/// The single fan-out task.
///
/// Reads the registry, never mutates it: a recipient that fails a
/// write is asked to close and its session performs the removal.
pub struct Broadcaster {
    registry: Arc<Registry>,
    inbox: OutboundReceiver,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>, inbox: OutboundReceiver) -> Self {
        Self { registry, inbox }
    }

    /// Consume the queue until every producer is dropped.
    pub async fn run(mut self) {
        info!("broadcaster started");

        while let Some(msg) = self.inbox.recv().await {
            self.deliver(&msg).await;
        }

        info!("broadcaster stopped");
    }

    /// One fan-out pass: snapshot under the lock, write outside it.
    ///
    /// Delivery is serialized, so a slow recipient delays the rest of
    /// the pass. Accepted for this design; flow control is out of scope.
    async fn deliver(&self, msg: &OutboundMessage) {
        let recipients = self.registry.snapshot().await;
        let mut delivered = 0usize;

        for entry in &recipients {
            if msg.sender == Some(entry.conn.id()) {
                continue;
            }
            match entry.conn.send_line(&msg.text).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    // Keep the pass going; the dead recipient's session
                    // deregisters it once it sees the close request.
                    warn!(peer = %entry.conn.peer(), error = %err, "write failed, requesting close");
                    entry.conn.request_close();
                }
            }
        }

        debug!(from = %msg.from, delivered, "fan-out complete");
    }
}
