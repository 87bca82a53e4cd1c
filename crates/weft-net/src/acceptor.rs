//! Inter-process connection wrapper.

use std::{fmt, sync::Arc};

use crate::session::{Endpoint, Session, Transport};

/// A link between a frontend and a backend process.
///
/// Unlike agents, acceptors are not evicted when their session closes; the
/// owner calls [`crate::NetService::remove_acceptor`] explicitly.
pub struct Acceptor {
    id: u64,
    session: Arc<Session>,
    remote_addr: String,
}

impl Acceptor {
    pub(crate) fn new(id: u64, transport: Box<dyn Transport>) -> Self {
        let remote_addr = transport.remote_addr();
        let session = Arc::new(Session::new(Arc::new(Endpoint::new(id, transport))));
        Self { id, session, remote_addr }
    }

    /// Registry id (acceptor namespace).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session bound to this acceptor.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Peer address captured at accept time.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }
}

impl fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptor")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("session", &self.session)
            .finish()
    }
}

impl fmt::Display for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acceptor {} [{}] {}", self.id, self.remote_addr, self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TransportError, session::SessionStatus};

    struct Null;

    impl Transport for Null {
        fn write_frame(&self, _frame: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        fn remote_addr(&self) -> String {
            "10.0.0.2:3250".to_string()
        }
    }

    #[test]
    fn session_is_bound_to_acceptor_id() {
        let acceptor = Acceptor::new(5, Box::new(Null));
        assert_eq!(acceptor.id(), 5);
        assert_eq!(acceptor.session().id(), 5);
        assert_eq!(acceptor.session().status(), SessionStatus::Start);
        assert_eq!(acceptor.remote_addr(), "10.0.0.2:3250");
    }

    #[test]
    fn display_describes_session() {
        let acceptor = Acceptor::new(2, Box::new(Null));
        assert_eq!(acceptor.to_string(), "acceptor 2 [10.0.0.2:3250] session 2 (Start, last_id 0)");
    }
}
