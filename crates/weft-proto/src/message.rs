//! Logical message envelope carried inside data packets.
//!
//! Layout:
//!
//! ```text
//! flag (1 byte)     type << 1 | route_compressed
//! id   (varint)     Request, Response only
//! route (u8 + utf8) Request, Notify, Push only
//! data              remaining bytes
//! ```
//!
//! The id varint stores 7 bits per byte, least significant group first, with
//! the high bit set on every byte except the last.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

/// Longest route the one-byte length prefix can carry.
pub const MAX_ROUTE_LEN: usize = u8::MAX as usize;

/// A `u64` never needs more than ten 7-bit groups.
const MAX_VARINT_LEN: usize = 10;

const ROUTE_COMPRESSED: u8 = 0x01;
const TYPE_MASK: u8 = 0x07;

/// Message kind.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client request expecting a correlated response
    Request = 0,
    /// Client message that must not be answered
    Notify = 1,
    /// Server reply correlated to a request id
    Response = 2,
    /// Server-initiated message addressed by route
    Push = 3,
}

impl MessageType {
    /// Wire representation (before shifting into the flag byte).
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Request),
            1 => Some(Self::Notify),
            2 => Some(Self::Response),
            3 => Some(Self::Push),
            _ => None,
        }
    }

    /// Whether this kind carries a correlation id.
    #[must_use]
    pub fn has_id(self) -> bool {
        matches!(self, Self::Request | Self::Response)
    }

    /// Whether this kind carries a route.
    #[must_use]
    pub fn has_route(self) -> bool {
        !matches!(self, Self::Response)
    }
}

/// Decoded message envelope.
///
/// Fields that the kind does not carry are zero/empty: `id` is 0 for notify
/// and push, `route` is empty for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message kind
    pub kind: MessageType,
    /// Correlation id (request/response only)
    pub id: u64,
    /// Handler route (request/notify/push only)
    pub route: String,
    /// Opaque payload
    pub data: Bytes,
}

impl Message {
    /// Server push addressed by route.
    #[must_use]
    pub fn push(route: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self { kind: MessageType::Push, id: 0, route: route.into(), data: data.into() }
    }

    /// Response correlated to request `id`.
    #[must_use]
    pub fn response(id: u64, data: impl Into<Bytes>) -> Self {
        Self { kind: MessageType::Response, id, route: String::new(), data: data.into() }
    }

    /// Request expecting a response with the same `id`.
    #[must_use]
    pub fn request(id: u64, route: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self { kind: MessageType::Request, id, route: route.into(), data: data.into() }
    }

    /// One-way notify.
    #[must_use]
    pub fn notify(route: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self { kind: MessageType::Notify, id: 0, route: route.into(), data: data.into() }
    }

    /// Encode the envelope.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MissingId` for a request/response with id 0
    /// - `ProtocolError::MissingRoute` for a request/notify/push with an empty
    ///   route
    /// - `ProtocolError::RouteTooLong` if the route exceeds [`MAX_ROUTE_LEN`]
    pub fn encode(&self) -> Result<Bytes> {
        let kind = self.kind;
        if kind.has_id() && self.id == 0 {
            return Err(ProtocolError::MissingId { kind });
        }
        if kind.has_route() {
            if self.route.is_empty() {
                return Err(ProtocolError::MissingRoute { kind });
            }
            if self.route.len() > MAX_ROUTE_LEN {
                return Err(ProtocolError::RouteTooLong {
                    len: self.route.len(),
                    max: MAX_ROUTE_LEN,
                });
            }
        }

        let mut buf =
            BytesMut::with_capacity(1 + MAX_VARINT_LEN + 1 + self.route.len() + self.data.len());
        buf.put_u8(kind.to_u8() << 1);

        if kind.has_id() {
            put_varint(&mut buf, self.id);
        }
        if kind.has_route() {
            buf.put_u8(self.route.len() as u8);
            buf.put_slice(self.route.as_bytes());
        }
        buf.put_slice(&self.data);

        Ok(buf.freeze())
    }

    /// Decode an envelope from a data packet payload.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MessageTooShort` on an empty buffer
    /// - `ProtocolError::CompressedRoute` if the route-compressed bit is set
    /// - `ProtocolError::UnknownMessageType` for an unknown type
    /// - `ProtocolError::InvalidVarint` for a truncated or oversized id
    /// - `ProtocolError::InvalidRoute` for a truncated or non-UTF-8 route
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&flag, mut rest) = bytes.split_first().ok_or(ProtocolError::MessageTooShort)?;

        if flag & ROUTE_COMPRESSED != 0 {
            return Err(ProtocolError::CompressedRoute);
        }

        let raw_kind = (flag >> 1) & TYPE_MASK;
        let kind =
            MessageType::from_u8(raw_kind).ok_or(ProtocolError::UnknownMessageType(raw_kind))?;

        let mut id = 0;
        if kind.has_id() {
            let (value, consumed) = get_varint(rest)?;
            id = value;
            rest = rest.get(consumed..).unwrap_or_default();
        }

        let mut route = String::new();
        if kind.has_route() {
            let (&len, tail) = rest.split_first().ok_or(ProtocolError::InvalidRoute)?;
            let len = usize::from(len);
            let raw = tail.get(..len).ok_or(ProtocolError::InvalidRoute)?;
            route = std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidRoute)?.to_owned();
            rest = tail.get(len..).unwrap_or_default();
        }

        Ok(Self { kind, id, route, data: Bytes::copy_from_slice(rest) })
    }
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(group);
            return;
        }
        buf.put_u8(group | 0x80);
    }
}

/// Returns the decoded value and the number of bytes consumed.
fn get_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        // The tenth group holds only the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(ProtocolError::InvalidVarint);
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(ProtocolError::InvalidVarint)
}
