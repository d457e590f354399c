//! Basic type definitions for the chat server
//!
//! Provides the `ConnId` newtype: a UUID-based identifier for live
//! connections, used as the registry key.

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 so reconnects from the same address never collide.
/// Implements Hash and Eq for use as a HashMap key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub Uuid);

impl ConnId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conn_id_unique() {
        let id1 = ConnId::new();
        let id2 = ConnId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_conn_id_display_matches_uuid() {
        let id = ConnId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }
}
