//! Wire protocol definitions
//!
//! The protocol is plain newline-delimited UTF-8 text. This module owns
//! every line the server emits, the disconnect keyword, and the
//! `OutboundMessage` unit that flows through the broadcast queue.

use crate::types::ConnId;

/// Greeting sent the moment a connection is accepted (two wire lines).
pub const WELCOME_BANNER: &str =
    "--- Welcome to PipChat ---\nIf you'd like to exit, please type 'BYE'";

/// Prompt for the first line the client sends.
pub const NAME_PROMPT: &str = "Please enter a display name:";

/// Farewell sent to a cleanly-disconnecting client before close.
pub const GOODBYE: &str = "Goodbye";

/// Keyword that ends a session.
pub const DISCONNECT_KEYWORD: &str = "BYE";

/// True when a received line is a disconnect request.
///
/// Exact match on the trimmed line, case-insensitive. A chat line that
/// merely contains "bye" must be relayed, not treated as a disconnect.
pub fn is_disconnect(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(DISCONNECT_KEYWORD)
}

/// `"<username>: <text>"` — a relayed chat line.
pub fn chat_line(username: &str, text: &str) -> String {
    format!("{username}: {text}")
}

/// `"<username> has connected"` — join announcement.
pub fn joined_line(username: &str) -> String {
    format!("{username} has connected")
}

/// `"<username> has disconnected"` — leave announcement.
pub fn left_line(username: &str) -> String {
    format!("{username} has disconnected")
}

/// `"<username> is available to chat"` — one roster entry.
pub fn roster_line(username: &str) -> String {
    format!("{username} is available to chat")
}

/// One message travelling through the broadcast queue.
///
/// Ephemeral: created by a session (or the operator console), consumed
/// once by the broadcaster, discarded.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Exact line written to recipients, without the trailing newline.
    pub text: String,
    /// Originating connection. `None` for operator messages, which are
    /// delivered to every registered client.
    pub sender: Option<ConnId>,
    /// Display name of the originator, for diagnostics.
    pub from: String,
}

impl OutboundMessage {
    /// Chat line relayed on behalf of a registered client.
    pub fn chat(sender: ConnId, username: &str, text: &str) -> Self {
        Self {
            text: chat_line(username, text),
            sender: Some(sender),
            from: username.to_string(),
        }
    }

    /// Join announcement; the joiner itself is excluded from delivery.
    pub fn joined(sender: ConnId, username: &str) -> Self {
        Self {
            text: joined_line(username),
            sender: Some(sender),
            from: username.to_string(),
        }
    }

    /// Leave announcement; the departed connection is excluded even
    /// before its deregistration lands.
    pub fn left(sender: ConnId, username: &str) -> Self {
        Self {
            text: left_line(username),
            sender: Some(sender),
            from: username.to_string(),
        }
    }

    /// Operator-console line, delivered to every registered client.
    pub fn operator(name: &str, text: &str) -> Self {
        Self {
            text: chat_line(name, text),
            sender: None,
            from: name.to_string(),
        }
    }
}
