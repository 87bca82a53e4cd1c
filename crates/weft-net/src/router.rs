//! Outbound message routing.
//!
//! Every outbound path ends in the same pipeline:
//!
//! ```text
//! Message (push | response) → encode → Packet(Data) → encode → Entity::send
//! ```
//!
//! Targeted sends (`push`, `response`) return encode failures to the caller.
//! Fan-outs (`broadcast`, `multicast`) return nothing: a failing target is
//! logged and skipped so that one broken client never blocks the rest.
//!
//! Transport write failures are logged and not reported at this layer; the
//! connection's read loop detects the dead peer and closes the session.

use bytes::Bytes;
use tracing::{error, trace, warn};
use weft_proto::{Message, Packet, PacketType, ProtocolError};

use crate::{error::NetError, registry::NetService, session::Session};

/// Serialize `message` and frame it as a data packet.
fn encode_data_frame(message: &Message) -> Result<Bytes, ProtocolError> {
    let encoded = message.encode()?;
    Packet::new(PacketType::Data, encoded).encode()
}

impl NetService {
    /// Hand a framed packet to the session's transport.
    pub(crate) fn send(&self, session: &Session, frame: &[u8]) {
        if let Err(e) = session.entity().send(frame) {
            warn!(session_id = session.id(), error = %e, "transport write failed");
        }
    }

    /// Send a push message to one session.
    ///
    /// # Errors
    ///
    /// - `NetError::Encode` if the message or packet cannot be encoded;
    ///   nothing is sent
    pub fn push(&self, session: &Session, route: &str, data: &[u8]) -> Result<(), NetError> {
        let message = Message::push(route, Bytes::copy_from_slice(data));
        let frame = encode_data_frame(&message).inspect_err(|e| {
            error!(session_id = session.id(), route, error = %e, "push encode failed");
        })?;

        self.send(session, &frame);
        Ok(())
    }

    /// Answer the request the session is currently handling.
    ///
    /// The response carries the session's `last_id` as correlation id.
    ///
    /// # Errors
    ///
    /// - `NetError::NotifyReply` if `last_id` is 0 (the inbound message was a
    ///   notify); nothing is encoded or sent
    /// - `NetError::Encode` if the message or packet cannot be encoded
    pub fn response(&self, session: &Session, data: &[u8]) -> Result<(), NetError> {
        let last_id = session.last_id();
        if last_id == 0 {
            return Err(NetError::NotifyReply);
        }

        let message = Message::response(last_id, Bytes::copy_from_slice(data));
        let frame = encode_data_frame(&message).inspect_err(|e| {
            error!(session_id = session.id(), last_id, error = %e, "response encode failed");
        })?;

        self.send(session, &frame);
        Ok(())
    }

    /// Push to every registered agent. No-op on a backend.
    ///
    /// The frame is encoded once and shared by all targets. The agent map's
    /// read lock is held for the whole scan.
    pub fn broadcast(&self, route: &str, data: &[u8]) {
        if !self.config.is_frontend() {
            return;
        }

        let Some(frame) = self.fan_out_frame(route, data) else {
            return;
        };

        let agents = self.agents.read();
        for agent in agents.values() {
            self.send(agent.session(), &frame);
        }
        trace!(route, recipients = agents.len(), "broadcast");
    }

    /// Push to the listed agents. Unknown ids are skipped silently.
    ///
    /// Duplicate ids receive the message once per occurrence.
    pub fn multicast(&self, ids: &[u64], route: &str, data: &[u8]) {
        let Some(frame) = self.fan_out_frame(route, data) else {
            return;
        };

        let agents = self.agents.read();
        let mut recipients = 0usize;
        for id in ids {
            if let Some(agent) = agents.get(id) {
                self.send(agent.session(), &frame);
                recipients += 1;
            }
        }
        trace!(route, requested = ids.len(), recipients, "multicast");
    }

    /// Encode the shared push frame for a fan-out, logging failure.
    fn fan_out_frame(&self, route: &str, data: &[u8]) -> Option<Bytes> {
        encode_data_frame(&Message::push(route, Bytes::copy_from_slice(data)))
            .inspect_err(|e| error!(route, error = %e, "fan-out encode failed"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use weft_proto::MessageType;

    use super::*;
    use crate::{config::NetConfig, error::TransportError, session::Transport};

    #[derive(Clone, Default)]
    struct Recorder {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Recorder {
        fn messages(&self) -> Vec<Message> {
            self.frames
                .lock()
                .iter()
                .map(|frame| {
                    let packet = Packet::decode(frame).unwrap();
                    assert_eq!(packet.kind, PacketType::Data);
                    Message::decode(&packet.payload).unwrap()
                })
                .collect()
        }
    }

    impl Transport for Recorder {
        fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }

        fn remote_addr(&self) -> String {
            "recorder".to_string()
        }
    }

    #[test]
    fn push_frames_route_and_data() {
        let net = NetService::default();
        let recorder = Recorder::default();
        let agent = net.create_agent(recorder.clone());

        net.push(agent.session(), "room.join", b"alice").unwrap();

        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageType::Push);
        assert_eq!(messages[0].route, "room.join");
        assert_eq!(messages[0].id, 0);
        assert_eq!(&messages[0].data[..], b"alice");
    }

    #[test]
    fn push_with_oversized_route_sends_nothing() {
        let net = NetService::default();
        let recorder = Recorder::default();
        let agent = net.create_agent(recorder.clone());

        let route = "x".repeat(300);
        let err = net.push(agent.session(), &route, b"").unwrap_err();

        assert!(matches!(err, NetError::Encode(ProtocolError::RouteTooLong { .. })));
        assert!(recorder.frames.lock().is_empty());
    }

    #[test]
    fn response_requires_request_context() {
        let net = NetService::default();
        let recorder = Recorder::default();
        let agent = net.create_agent(recorder.clone());

        assert_eq!(net.response(agent.session(), b"nope"), Err(NetError::NotifyReply));
        assert!(recorder.frames.lock().is_empty());

        agent.session().set_last_id(7);
        net.response(agent.session(), b"ok").unwrap();

        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageType::Response);
        assert_eq!(messages[0].id, 7);
        assert_eq!(&messages[0].data[..], b"ok");
    }

    #[test]
    fn broadcast_reaches_every_agent() {
        let net = NetService::new(NetConfig::frontend());
        let recorders: Vec<Recorder> = (0..4).map(|_| Recorder::default()).collect();
        for recorder in &recorders {
            net.create_agent(recorder.clone());
        }

        net.broadcast("world.tick", b"1");

        for recorder in &recorders {
            let messages = recorder.messages();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].route, "world.tick");
        }
    }

    #[test]
    fn broadcast_is_noop_on_backend() {
        let net = NetService::new(NetConfig::backend());
        let recorder = Recorder::default();
        net.create_agent(recorder.clone());

        net.broadcast("world.tick", b"1");

        assert!(recorder.frames.lock().is_empty());
    }

    #[test]
    fn broadcast_encode_failure_sends_nothing() {
        let net = NetService::default();
        let recorder = Recorder::default();
        net.create_agent(recorder.clone());

        net.broadcast("", b"1");

        assert!(recorder.frames.lock().is_empty());
    }

    #[test]
    fn multicast_skips_unknown_ids() {
        let net = NetService::default();
        let first = Recorder::default();
        let second = Recorder::default();
        let bystander = Recorder::default();
        let a = net.create_agent(first.clone());
        let b = net.create_agent(second.clone());
        net.create_agent(bystander.clone());

        net.multicast(&[a.id(), 999, b.id()], "chat.msg", b"hey");

        assert_eq!(first.messages().len(), 1);
        assert_eq!(second.messages().len(), 1);
        assert!(bystander.frames.lock().is_empty());
    }
}
