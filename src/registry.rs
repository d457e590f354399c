//! Client registry
//!
//! The authoritative membership map: every connection that has
//! completed the join sequence and not yet left. One exclusive lock
//! guards the map, and nothing performs network I/O while holding it —
//! readers take a snapshot and write against that.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::Connection;
use crate::error::RegistryError;
use crate::types::ConnId;

/// One registered client: the shared connection handle and the name
/// chosen (or assigned) at join time. The name is immutable after join
/// and not guaranteed unique across entries.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub conn: Arc<Connection>,
    pub username: String,
}

/// Lock-guarded map of live, joined connections.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<ConnId, RegistryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its chosen username.
    ///
    /// Makes the connection visible to subsequent broadcasts. Fails
    /// only when the id is already present, which indicates a bug in
    /// the caller: ids are generated fresh per accept.
    pub async fn register(
        &self,
        conn: Arc<Connection>,
        username: String,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        let id = conn.id();
        if entries.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        entries.insert(id, RegistryEntry { conn, username });
        debug!(clients = entries.len(), %id, "registered connection");
        Ok(())
    }

    /// Remove a connection; absent ids are a no-op.
    ///
    /// Returns the removed entry so the caller knows whether a leave
    /// announcement is owed.
    pub async fn deregister(&self, id: ConnId) -> Option<RegistryEntry> {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(&id);
        if removed.is_some() {
            debug!(clients = entries.len(), %id, "deregistered connection");
        }
        removed
    }

    /// Consistent point-in-time copy of all entries.
    ///
    /// Cheap: one `Arc` and one `String` clone per client. Callers do
    /// their I/O against the snapshot, never under the lock.
    pub async fn snapshot(&self) -> Vec<RegistryEntry> {
        let entries = self.entries.lock().await;
        entries.values().cloned().collect()
    }

    /// Number of registered clients.
    pub async fn client_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
