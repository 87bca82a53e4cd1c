//! Heartbeat driver.
//!
//! Called by an external periodic trigger (see [`crate::HeartbeatTicker`]),
//! never scheduled from inside the registry.

use tracing::trace;

use crate::{registry::NetService, session::SessionStatus};

impl NetService {
    /// Send the shared heartbeat frame to every working agent.
    ///
    /// No-op on a backend. Agents in any other state (still handshaking or
    /// mid-teardown) are skipped. Each agent that receives a frame has its
    /// heartbeat bookkeeping advanced.
    pub fn heartbeat(&self) {
        if !self.config.is_frontend() {
            return;
        }

        let agents = self.agents.read();
        let mut sent = 0usize;
        for agent in agents.values() {
            if agent.status() != SessionStatus::Working {
                continue;
            }
            self.send(agent.session(), &self.heartbeat_frame);
            agent.heartbeat();
            sent += 1;
        }
        trace!(sent, registered = agents.len(), "heartbeat tick");
    }
}
