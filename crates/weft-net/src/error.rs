//! Error types for registry lookups, routing and transports.
//!
//! Routing errors are returned to the direct caller of a targeted send
//! (`push`, `response`). Fan-out operations log and swallow them.

use std::io;

use thiserror::Error;
use weft_proto::ProtocolError;

use crate::registry::RegistryKind;

/// Errors returned by [`crate::NetService`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// No entry with this id in the namespace
    ///
    /// Also returned for an id that has been reserved but not yet inserted by
    /// a concurrent create. Callers may retry.
    #[error("{kind} id {id} not found")]
    NotFound {
        /// Namespace that was searched
        kind: RegistryKind,
        /// Requested id
        id: u64,
    },

    /// The session's last inbound message was a notify, so there is nothing
    /// to correlate a response with
    #[error("current session is handling a notify message and cannot be responded to")]
    NotifyReply,

    /// Message serialization or packet framing failed
    #[error("encode error: {0}")]
    Encode(#[from] ProtocolError),
}

impl NetError {
    /// Returns true if this error is a failed lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors reported by a [`crate::Transport`] write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Peer is gone
    #[error("connection closed")]
    Closed,

    /// Underlying I/O failure
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => Self::Closed,
            _ => Self::Io(err.to_string()),
        }
    }
}
