//! Client-facing connection wrapper.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Instant,
};

use parking_lot::Mutex;

use crate::{
    error::TransportError,
    session::{Endpoint, Session, SessionStatus, Transport},
};

/// A client connection registered with a frontend process.
///
/// Owns the connection (through its session's [`Endpoint`]) and the heartbeat
/// bookkeeping used to detect dead clients. Every heartbeat sent bumps the
/// missed counter; inbound traffic resets it via [`Agent::touch`].
pub struct Agent {
    id: u64,
    session: Arc<Session>,
    remote_addr: String,
    missed_heartbeats: AtomicU32,
    last_heartbeat: Mutex<Option<Instant>>,
}

impl Agent {
    pub(crate) fn new(id: u64, transport: Box<dyn Transport>) -> Self {
        let remote_addr = transport.remote_addr();
        let session = Arc::new(Session::new(Arc::new(Endpoint::new(id, transport))));
        Self {
            id,
            session,
            remote_addr,
            missed_heartbeats: AtomicU32::new(0),
            last_heartbeat: Mutex::new(None),
        }
    }

    /// Registry id (agent namespace).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session bound to this agent.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Session status.
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Peer address captured at accept time.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Write a framed packet to the client.
    pub fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.session.entity().send(frame)
    }

    /// Record that a heartbeat was just sent.
    pub fn heartbeat(&self) {
        self.missed_heartbeats.fetch_add(1, Ordering::AcqRel);
        *self.last_heartbeat.lock() = Some(Instant::now());
    }

    /// Record inbound activity from the client.
    pub fn touch(&self) {
        self.missed_heartbeats.store(0, Ordering::Release);
    }

    /// Heartbeats sent since the client was last heard from.
    pub fn missed_heartbeats(&self) -> u32 {
        self.missed_heartbeats.load(Ordering::Acquire)
    }

    /// When the last heartbeat went out. `None` if never.
    pub fn last_heartbeat(&self) -> Option<Instant> {
        *self.last_heartbeat.lock()
    }

    /// Whether more than `limit` heartbeats went unanswered.
    pub fn is_expired(&self, limit: u32) -> bool {
        self.missed_heartbeats() > limit
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("session", &self.session)
            .field("missed_heartbeats", &self.missed_heartbeats())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent {} [{}] {}", self.id, self.remote_addr, self.session)
    }
}
