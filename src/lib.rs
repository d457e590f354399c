//! PipChat: a multi-client line-oriented TCP chat server
//!
//! Clients connect over plain TCP, pick a display name, and every line
//! they send afterwards is relayed to everyone else in the room.
//!
//! # Features
//! - Plain TCP with a newline-delimited protocol (netcat is a client)
//! - Display-name handshake, with generated names for blank answers
//! - Room-wide fan-out plus join, leave, and roster announcements
//! - "BYE" ends a session with a farewell line
//! - Operator console that broadcasts from the server terminal
//! - Safe mode keeps peer addresses out of logs
//!
//! # Architecture
//! One task per concern, no global state:
//! - every accepted socket runs its own session task owning the read half
//! - all outbound traffic funnels through one queue into a single
//!   broadcaster task, which gives every client the same message order
//! - the `Registry` tracks who is connected behind an async mutex that
//!   is never held across socket I/O
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use pipchat::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:8008").await.unwrap();
//!     let server = ChatServer::new(listener, ServerConfig::default());
//!     server.run_until_ctrl_c().await;
//! }
//! ```

pub mod broadcast;
pub mod cli;
pub mod connection;
pub mod console;
pub mod error;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{outbound_queue, Broadcaster, OutboundQueue, OutboundReceiver};
pub use cli::Cli;
pub use connection::Connection;
pub use error::{ChatError, RegistryError};
pub use message::OutboundMessage;
pub use registry::{Registry, RegistryEntry};
pub use server::{ChatServer, ServerConfig, ServerState};
pub use session::handle_session;
pub use types::ConnId;
