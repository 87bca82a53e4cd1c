//! Connection identity and message routing for weft servers.
//!
//! A weft deployment is split into frontend processes, which hold client
//! connections, and backend processes, reached from frontends over internal
//! links. This crate tracks both kinds of connection and routes outbound
//! traffic to them.
//!
//! # Components
//!
//! - [`NetService`]: the registry. Mints [`Agent`]s (client connections) and
//!   [`Acceptor`]s (inter-process links) with ids from two independent
//!   namespaces.
//! - Routing: [`NetService::push`], [`NetService::response`],
//!   [`NetService::broadcast`], [`NetService::multicast`].
//! - Lifecycle: [`NetService::close_session`] and
//!   [`NetService::on_session_closed`] subscribers.
//! - Liveness: [`NetService::heartbeat`], optionally driven by a
//!   [`HeartbeatTicker`].
//!
//! # Concurrency
//!
//! Every operation is a synchronous call on the caller's thread. The only
//! blocking point is the transport write; no timeouts are imposed here.
//! Registry scans (broadcast, multicast, heartbeat, dumps) hold the read side
//! of the agent map for their duration, so a transport MUST NOT call back into
//! `close_session` from inside `write_frame`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod acceptor;
mod agent;
pub mod config;
mod error;
mod heartbeat;
mod lifecycle;
mod registry;
mod router;
pub mod session;
mod ticker;

pub use acceptor::Acceptor;
pub use agent::Agent;
pub use config::{NetConfig, Role};
pub use error::{NetError, TransportError};
pub use lifecycle::CloseCallback;
pub use registry::{NetService, RegistryKind};
pub use session::{Endpoint, Entity, Session, SessionStatus, Transport};
pub use ticker::HeartbeatTicker;
