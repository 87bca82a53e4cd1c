//! Transport packet framing.
//!
//! A `Packet` is the unit written to a connection:
//! - 1-byte packet type
//! - 3-byte payload length (Big Endian)
//! - payload bytes (a [`crate::Message`] for data packets, empty otherwise)
//!
//! The format is deliberately tiny so that clients on constrained platforms
//! can implement it by hand.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

/// Size of the packet header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 24-bit length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = 0x00FF_FFFF;

const HEARTBEAT_FRAME: [u8; HEADER_SIZE] = [PacketType::Heartbeat as u8, 0, 0, 0];

/// Packet type carried in the first header byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Client greeting, carries handshake parameters
    Handshake = 0x01,
    /// Client acknowledgement of the server handshake
    HandshakeAck = 0x02,
    /// Liveness probe, empty payload
    Heartbeat = 0x03,
    /// Application message
    Data = 0x04,
    /// Server-initiated disconnect
    Kick = 0x05,
}

impl PacketType {
    /// Wire representation.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Handshake),
            0x02 => Some(Self::HandshakeAck),
            0x03 => Some(Self::Heartbeat),
            0x04 => Some(Self::Data),
            0x05 => Some(Self::Kick),
            _ => None,
        }
    }
}

/// Pre-encoded heartbeat packet.
///
/// Heartbeats never change, so every send shares these same static bytes.
#[must_use]
pub fn heartbeat_frame() -> Bytes {
    Bytes::from_static(&HEARTBEAT_FRAME)
}

/// A single framed packet.
///
/// # Invariants
///
/// - `payload.len()` MUST NOT exceed [`MAX_PAYLOAD_SIZE`]. Construction does
///   not check this; [`Packet::encode`] rejects oversized packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type
    pub kind: PacketType,
    /// Raw payload bytes
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet of the given type.
    #[must_use]
    pub fn new(kind: PacketType, payload: impl Into<Bytes>) -> Self {
        Self { kind, payload: payload.into() }
    }

    /// Empty heartbeat packet.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(PacketType::Heartbeat, Bytes::new())
    }

    /// Encode into a freshly allocated frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds
    ///   [`MAX_PAYLOAD_SIZE`]
    pub fn encode(&self) -> Result<Bytes> {
        let len = self.payload.len();
        if len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size: len, max: MAX_PAYLOAD_SIZE });
        }

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + len);
        buf.put_u8(self.kind.to_u8());
        let [_, hi, mid, lo] = (len as u32).to_be_bytes();
        buf.put_slice(&[hi, mid, lo]);
        buf.put_slice(&self.payload);

        Ok(buf.freeze())
    }

    /// Decode a single packet from the front of `bytes`.
    ///
    /// Trailing bytes after the payload are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if fewer than [`HEADER_SIZE`] bytes
    /// - `ProtocolError::UnknownPacketType` if the type byte is unrecognized
    /// - `ProtocolError::FrameTruncated` if the payload is shorter than the
    ///   header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (kind, len) = parse_header(bytes)?;

        let payload = bytes.get(HEADER_SIZE..HEADER_SIZE + len).ok_or(
            ProtocolError::FrameTruncated {
                expected: len,
                actual: bytes.len().saturating_sub(HEADER_SIZE),
            },
        )?;

        Ok(Self { kind, payload: Bytes::copy_from_slice(payload) })
    }
}

/// Parse type and payload length from a packet header.
fn parse_header(bytes: &[u8]) -> Result<(PacketType, usize)> {
    let &[kind, hi, mid, lo] = bytes
        .first_chunk::<HEADER_SIZE>()
        .ok_or(ProtocolError::FrameTooShort { expected: HEADER_SIZE, actual: bytes.len() })?;

    let kind = PacketType::from_u8(kind).ok_or(ProtocolError::UnknownPacketType(kind))?;
    let len = u32::from_be_bytes([0, hi, mid, lo]) as usize;

    Ok((kind, len))
}

/// Incremental packet decoder for stream transports.
///
/// Bytes arrive in arbitrary chunks; the decoder buffers partial packets and
/// yields each one once its payload is complete.
#[derive(Debug, Default)]
pub struct PacketDecoder {
    buf: BytesMut,
}

impl PacketDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete packet, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownPacketType` if the buffered header is invalid.
    ///   The stream cannot be resynchronized after this; close the connection.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        if self.buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let (kind, len) = parse_header(&self.buf)?;
        if self.buf.len() < HEADER_SIZE + len {
            return Ok(None);
        }

        self.buf.advance(HEADER_SIZE);
        let payload = self.buf.split_to(len).freeze();

        Ok(Some(Packet { kind, payload }))
    }

    /// Feed `data` and drain every packet it completes.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Packet>> {
        self.extend(data);

        let mut packets = Vec::new();
        while let Some(packet) = self.next_packet()? {
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Number of buffered bytes not yet returned as packets.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}
