//! Fuzz target for PacketDecoder chunk boundaries
//!
//! # Strategy
//!
//! Build a valid stream from arbitrary packets, then split it at arbitrary
//! offsets before feeding the stream decoder.
//!
//! # Invariants
//!
//! - Chunking never changes the decoded packets
//! - No bytes remain buffered once the whole stream is fed

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use weft_proto::{Packet, PacketDecoder, PacketType};

#[derive(Debug, Arbitrary)]
enum Kind {
    Handshake,
    HandshakeAck,
    Heartbeat,
    Data,
    Kick,
}

impl From<Kind> for PacketType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Handshake => Self::Handshake,
            Kind::HandshakeAck => Self::HandshakeAck,
            Kind::Heartbeat => Self::Heartbeat,
            Kind::Data => Self::Data,
            Kind::Kick => Self::Kick,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    packets: Vec<(Kind, Vec<u8>)>,
    cuts: Vec<u16>,
}

fuzz_target!(|input: Input| {
    let packets: Vec<Packet> = input
        .packets
        .into_iter()
        .map(|(kind, payload)| Packet::new(kind.into(), Bytes::from(payload)))
        .collect();

    let mut wire = Vec::new();
    for packet in &packets {
        wire.extend_from_slice(&packet.encode().expect("small payload encodes"));
    }

    let mut offsets: Vec<usize> =
        input.cuts.iter().map(|&c| c as usize % (wire.len() + 1)).collect();
    offsets.push(0);
    offsets.push(wire.len());
    offsets.sort_unstable();

    let mut decoder = PacketDecoder::new();
    let mut decoded = Vec::new();
    for span in offsets.windows(2) {
        decoded.extend(decoder.decode(&wire[span[0]..span[1]]).expect("valid stream decodes"));
    }

    assert_eq!(decoded, packets);
    assert_eq!(decoder.buffered(), 0);
});
