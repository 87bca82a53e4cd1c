//! Per-connection session state.
//!
//! A [`Session`] is what application code holds while handling a message: it
//! knows where replies go (its [`Entity`]), which request a response should
//! correlate with (`last_id`) and whether the connection is still usable
//! (`status`).
//!
//! # State Machine
//!
//! ```text
//! ┌───────┐  handshake  ┌───────────┐  ack   ┌─────────┐  close  ┌────────┐
//! │ Start │────────────>│ Handshake │───────>│ Working │────────>│ Closed │
//! └───────┘             └───────────┘        └─────────┘         └────────┘
//! ```
//!
//! Transitions are driven by the connection handler. The registry only reads
//! the status (heartbeats go to `Working` sessions only) and reacts to the
//! final `Closed` transition.

use std::{
    fmt,
    io::Write,
    net::TcpStream,
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
};

use crate::error::TransportError;

/// Connection lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Accepted, no handshake yet
    Start = 0,
    /// Handshake sent, waiting for acknowledgement
    Handshake = 1,
    /// Fully established
    Working = 2,
    /// Torn down
    Closed = 3,
}

impl SessionStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Start,
            1 => Self::Handshake,
            2 => Self::Working,
            _ => Self::Closed,
        }
    }
}

/// Byte-oriented connection handed to the registry on accept.
///
/// Writes take `&self` so one connection can be shared between the read loop,
/// the router and the heartbeat tick. Each call MUST write the whole frame or
/// fail; partial frames desynchronize the peer's decoder.
pub trait Transport: Send + Sync + 'static {
    /// Write one complete frame.
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Peer address for diagnostics.
    fn remote_addr(&self) -> String;
}

impl Transport for TcpStream {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        let mut stream: &TcpStream = self;
        stream.write_all(frame)?;
        Ok(())
    }

    fn remote_addr(&self) -> String {
        self.peer_addr().map_or_else(|_| "unknown".to_string(), |addr| addr.to_string())
    }
}

/// Send capability behind a session.
pub trait Entity: Send + Sync {
    /// Registry id of the owning agent or acceptor.
    fn id(&self) -> u64;

    /// Write a framed packet to the peer.
    fn send(&self, frame: &[u8]) -> Result<(), TransportError>;
}

/// [`Entity`] binding a registry id to its transport.
pub struct Endpoint {
    id: u64,
    transport: Box<dyn Transport>,
}

impl Endpoint {
    /// Bind `transport` to registry id `id`.
    pub fn new(id: u64, transport: Box<dyn Transport>) -> Self {
        Self { id, transport }
    }
}

impl Entity for Endpoint {
    fn id(&self) -> u64 {
        self.id
    }

    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.transport.write_frame(frame)
    }
}

/// Logical state of one connection.
pub struct Session {
    entity: Arc<dyn Entity>,
    /// Id of the last inbound request, 0 after a notify
    last_id: AtomicU64,
    status: AtomicU8,
}

impl Session {
    /// Create a session in [`SessionStatus::Start`].
    pub fn new(entity: Arc<dyn Entity>) -> Self {
        Self {
            entity,
            last_id: AtomicU64::new(0),
            status: AtomicU8::new(SessionStatus::Start as u8),
        }
    }

    /// Registry id of the owning entity.
    pub fn id(&self) -> u64 {
        self.entity.id()
    }

    /// Send capability.
    pub fn entity(&self) -> &Arc<dyn Entity> {
        &self.entity
    }

    /// Correlation id for the next response. 0 if the last inbound message
    /// was a notify.
    pub fn last_id(&self) -> u64 {
        self.last_id.load(Ordering::Acquire)
    }

    /// Record the id of the inbound message being handled (0 for notify).
    pub fn set_last_id(&self, id: u64) {
        self.last_id.store(id, Ordering::Release);
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Move to `status`.
    pub fn set_status(&self, status: SessionStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Mark the session closed. Returns `false` if it already was.
    pub fn close(&self) -> bool {
        self.status.swap(SessionStatus::Closed as u8, Ordering::AcqRel)
            != SessionStatus::Closed as u8
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("last_id", &self.last_id())
            .field("status", &self.status())
            .finish()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {} ({:?}, last_id {})", self.id(), self.status(), self.last_id())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Sink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl Transport for Arc<Sink> {
        fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }

        fn remote_addr(&self) -> String {
            "sink".to_string()
        }
    }

    fn session_with_sink(id: u64) -> (Session, Arc<Sink>) {
        let sink = Arc::new(Sink::default());
        let endpoint = Endpoint::new(id, Box::new(Arc::clone(&sink)));
        (Session::new(Arc::new(endpoint)), sink)
    }

    #[test]
    fn new_session_starts_clean() {
        let (session, _) = session_with_sink(9);
        assert_eq!(session.id(), 9);
        assert_eq!(session.last_id(), 0);
        assert_eq!(session.status(), SessionStatus::Start);
    }

    #[test]
    fn entity_send_reaches_transport() {
        let (session, sink) = session_with_sink(1);
        session.entity().send(&[1, 2, 3]).unwrap();
        assert_eq!(*sink.frames.lock(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn status_transitions() {
        let (session, _) = session_with_sink(1);
        session.set_status(SessionStatus::Handshake);
        assert_eq!(session.status(), SessionStatus::Handshake);
        session.set_status(SessionStatus::Working);
        assert_eq!(session.status(), SessionStatus::Working);
    }

    #[test]
    fn close_is_reported_once() {
        let (session, _) = session_with_sink(1);
        assert!(session.close());
        assert!(!session.close());
        assert_eq!(session.status(), SessionStatus::Closed);
    }

    #[test]
    fn display_includes_state() {
        let (session, _) = session_with_sink(4);
        session.set_last_id(12);
        assert_eq!(session.to_string(), "session 4 (Start, last_id 12)");
    }
}
