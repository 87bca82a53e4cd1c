//! Process configuration.
//!
//! The role decides which registry a process populates: frontends hold client
//! agents, backends only see acceptors from frontends. It is fixed for the
//! lifetime of a [`crate::NetService`] and consulted on every call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval between heartbeat ticks.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Heartbeats an agent may leave unanswered before it counts as expired.
pub const DEFAULT_MAX_MISSED_HEARTBEATS: u32 = 3;

/// Process role within the server fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Client-facing process, owns agents
    Frontend,
    /// Internal process reached through acceptors
    Backend,
}

impl Role {
    /// Whether this role holds client agents.
    #[must_use]
    pub fn is_frontend(self) -> bool {
        self == Self::Frontend
    }
}

/// Network service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Process role
    pub role: Role,
    /// Interval at which the heartbeat ticker fires
    pub heartbeat_interval: Duration,
    /// Unanswered heartbeats before an agent is considered expired
    pub max_missed_heartbeats: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            role: Role::Frontend,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_missed_heartbeats: DEFAULT_MAX_MISSED_HEARTBEATS,
        }
    }
}

impl NetConfig {
    /// Default configuration for a frontend process.
    #[must_use]
    pub fn frontend() -> Self {
        Self::default()
    }

    /// Default configuration for a backend process.
    #[must_use]
    pub fn backend() -> Self {
        Self { role: Role::Backend, ..Self::default() }
    }

    /// Whether the process is a frontend.
    #[must_use]
    pub fn is_frontend(&self) -> bool {
        self.role.is_frontend()
    }
}
