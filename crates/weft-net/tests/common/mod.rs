//! Shared test transports.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use weft_net::{Transport, TransportError};
use weft_proto::{Message, Packet, PacketType};

/// Transport that records every frame and can be switched into a failing
/// state to simulate a dead peer.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    broken: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose writes always fail.
    pub fn broken() -> Self {
        let transport = Self::default();
        transport.set_broken(true);
        transport
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    /// Raw frames written so far.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Decode every recorded data frame back into a message.
    pub fn messages(&self) -> Vec<Message> {
        self.frames
            .lock()
            .iter()
            .map(|frame| {
                let packet = Packet::decode(frame).expect("recorded frame decodes");
                assert_eq!(packet.kind, PacketType::Data);
                Message::decode(&packet.payload).expect("recorded message decodes")
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.frames.lock().push(frame.to_vec());
        Ok(())
    }

    fn remote_addr(&self) -> String {
        "127.0.0.1:0".to_string()
    }
}

/// Transport that discards everything.
pub struct NullTransport;

impl Transport for NullTransport {
    fn write_frame(&self, _frame: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn remote_addr(&self) -> String {
        "null".to_string()
    }
}
