//! Session teardown.
//!
//! When the connection handler observes a session moving to `Closed`, it calls
//! [`NetService::close_session`]. Subscribers registered with
//! [`NetService::on_session_closed`] run first, in registration order, then a
//! frontend evicts the owning agent.
//!
//! Callbacks run inline on the closing thread while the callback list's read
//! lock is held. A callback MUST NOT register another callback (the write lock
//! would wait on its own read lock) and should return quickly.

use std::sync::Arc;

use tracing::debug;

use crate::{registry::NetService, session::Session};

/// Subscriber invoked with the session being closed.
pub type CloseCallback = Arc<dyn Fn(&Session) + Send + Sync>;

impl NetService {
    /// Subscribe to session closure.
    ///
    /// Blocks while any `close_session` call is traversing the list.
    pub fn on_session_closed<F>(&self, callback: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.close_callbacks.write().push(Arc::new(callback));
    }

    /// Handle a closed session.
    ///
    /// Acceptors are never removed here, whatever the role; backend-side
    /// cleanup goes through [`NetService::remove_acceptor`].
    pub fn close_session(&self, session: &Session) {
        {
            let callbacks = self.close_callbacks.read();
            for callback in callbacks.iter() {
                callback(session);
            }
        }

        if self.config.is_frontend() {
            // Agent and acceptor ids overlap; only evict the agent that owns
            // this exact session
            let owned = self
                .get_agent(session.id())
                .is_ok_and(|agent| std::ptr::eq(agent.session().as_ref(), session));

            if owned {
                self.remove_agent(session.id());
            } else {
                debug!(session_id = session.id(), "closed session has no registered agent");
            }
            self.dump_agents();
        }
    }
}
