//! Error types for the chat server
//!
//! Defines the crate-level error and the registry's own error.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::ConnId;

/// Crate-level errors
///
/// Covers fatal session errors (stream I/O, closed queue) and registry
/// faults surfaced while joining. Any of these ends the affected
/// session; none of them touches other sessions.
#[derive(Debug, Error)]
pub enum ChatError {
    /// IO error on the underlying stream (fatal for that session)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry rejected an operation
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The broadcast queue is closed (server tearing down)
    #[error("broadcast queue closed")]
    QueueClosed,
}

/// Registry membership errors
///
/// A duplicate registration is a programming fault: connection ids are
/// generated fresh per accept, so correct operation never produces one.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The connection is already registered
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnId),
}
