//! Identity registry for agents and acceptors.
//!
//! Two independent namespaces, each with its own id counter and its own
//! id → entry map. Ids start at 1, increase monotonically and are never
//! reused. An agent and an acceptor may share the same numeric id.
//!
//! # Locking
//!
//! Every namespace has two locks: a counter lock held only across the
//! increment, and a map lock held across insert, delete and iteration. A
//! create takes them one after the other, never nested:
//!
//! ```text
//! create:  lock(counter) → id = next++ → unlock → build entry → lock(map) → insert → unlock
//! ```
//!
//! Between reservation and insert a lookup for the new id returns
//! [`NetError::NotFound`]. A half-built entry is never visible.

use std::{collections::BTreeMap, fmt, sync::Arc};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info};
use weft_proto::heartbeat_frame;

use crate::{
    acceptor::Acceptor,
    agent::Agent,
    config::NetConfig,
    error::NetError,
    lifecycle::CloseCallback,
    session::Transport,
};

/// Which namespace an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// Client agents (frontend only)
    Agent,
    /// Inter-process acceptors
    Acceptor,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => f.write_str("agent"),
            Self::Acceptor => f.write_str("acceptor"),
        }
    }
}

/// One id space: counter plus map, each behind its own lock.
pub(crate) struct Namespace<T> {
    kind: RegistryKind,
    next_id: Mutex<u64>,
    entries: RwLock<BTreeMap<u64, Arc<T>>>,
}

impl<T> Namespace<T> {
    fn new(kind: RegistryKind) -> Self {
        Self { kind, next_id: Mutex::new(1), entries: RwLock::new(BTreeMap::new()) }
    }

    fn reserve(&self) -> u64 {
        let mut next = self.next_id.lock();
        let id = *next;
        *next += 1;
        id
    }

    fn insert(&self, id: u64, entry: Arc<T>) {
        self.entries.write().insert(id, entry);
    }

    fn get(&self, id: u64) -> Result<Arc<T>, NetError> {
        self.entries.read().get(&id).cloned().ok_or(NetError::NotFound { kind: self.kind, id })
    }

    fn remove(&self, id: u64) -> Option<Arc<T>> {
        self.entries.write().remove(&id)
    }

    /// Read side of the map, held for the whole of a scan.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u64, Arc<T>>> {
        self.entries.read()
    }
}

/// Process-wide connection registry and message router.
///
/// Constructed once per process (or per test) and shared by `Arc` with the
/// accept loop, application handlers and the heartbeat ticker. All methods
/// take `&self` and are safe to call from any thread.
pub struct NetService {
    pub(crate) config: NetConfig,
    pub(crate) agents: Namespace<Agent>,
    pub(crate) acceptors: Namespace<Acceptor>,
    pub(crate) close_callbacks: RwLock<Vec<CloseCallback>>,
    pub(crate) heartbeat_frame: Bytes,
}

impl Default for NetService {
    fn default() -> Self {
        Self::new(NetConfig::default())
    }
}

impl NetService {
    /// Create an empty registry.
    pub fn new(config: NetConfig) -> Self {
        Self {
            config,
            agents: Namespace::new(RegistryKind::Agent),
            acceptors: Namespace::new(RegistryKind::Acceptor),
            close_callbacks: RwLock::new(Vec::new()),
            heartbeat_frame: heartbeat_frame(),
        }
    }

    /// Configuration this service was built with.
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Register a newly accepted client connection.
    pub fn create_agent(&self, transport: impl Transport) -> Arc<Agent> {
        let id = self.agents.reserve();
        let agent = Arc::new(Agent::new(id, Box::new(transport)));
        self.agents.insert(id, Arc::clone(&agent));

        debug!(agent_id = id, remote = agent.remote_addr(), "agent created");
        agent
    }

    /// Look up an agent by id.
    pub fn get_agent(&self, id: u64) -> Result<Arc<Agent>, NetError> {
        self.agents.get(id)
    }

    /// Evict an agent. Returns the removed entry, `None` if it was absent.
    pub fn remove_agent(&self, id: u64) -> Option<Arc<Agent>> {
        let removed = self.agents.remove(id);
        if removed.is_some() {
            debug!(agent_id = id, "agent removed");
        }
        removed
    }

    /// Register a newly established inter-process link.
    pub fn create_acceptor(&self, transport: impl Transport) -> Arc<Acceptor> {
        let id = self.acceptors.reserve();
        let acceptor = Arc::new(Acceptor::new(id, Box::new(transport)));
        self.acceptors.insert(id, Arc::clone(&acceptor));

        debug!(acceptor_id = id, remote = acceptor.remote_addr(), "acceptor created");
        acceptor
    }

    /// Look up an acceptor by id.
    pub fn get_acceptor(&self, id: u64) -> Result<Arc<Acceptor>, NetError> {
        self.acceptors.get(id)
    }

    /// Remove an acceptor. No-op if already removed.
    ///
    /// This is the only way an acceptor leaves the registry; closing its
    /// session does not remove it.
    pub fn remove_acceptor(&self, acceptor: &Acceptor) {
        if self.acceptors.remove(acceptor.id()).is_some() {
            debug!(acceptor_id = acceptor.id(), "acceptor removed");
        }
    }

    /// Number of registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }

    /// Number of registered acceptors.
    pub fn acceptor_count(&self) -> usize {
        self.acceptors.read().len()
    }

    /// Ids of all registered agents, ascending.
    pub fn agent_ids(&self) -> Vec<u64> {
        self.agents.read().keys().copied().collect()
    }

    /// Log every registered agent.
    pub fn dump_agents(&self) {
        let agents = self.agents.read();
        info!(count = agents.len(), "current agent count");
        for agent in agents.values() {
            info!(%agent, "agent session");
        }
    }

    /// Log every registered acceptor.
    pub fn dump_acceptors(&self) {
        let acceptors = self.acceptors.read();
        info!(count = acceptors.len(), "current acceptor count");
        for acceptor in acceptors.values() {
            info!(%acceptor, "acceptor session");
        }
    }
}
