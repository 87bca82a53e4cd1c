//! Protocol error types.

use thiserror::Error;

use crate::message::MessageType;

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or encoding wire data.
///
/// None of these are transient: a frame or message that fails once will fail
/// the same way on retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer shorter than the fixed packet header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Header claims more payload than the buffer holds
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload length claimed by the header
        expected: usize,
        /// Payload bytes actually available
        actual: usize,
    },

    /// Payload does not fit in the 24-bit length field
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum encodable size
        max: usize,
    },

    /// Packet type byte is not a known [`crate::PacketType`]
    #[error("unknown packet type: {0:#04x}")]
    UnknownPacketType(u8),

    /// Message buffer is empty
    #[error("message too short")]
    MessageTooShort,

    /// Message flag carries an unknown type
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Route does not fit in the one-byte length prefix
    #[error("route too long: {len} bytes exceeds maximum {max}")]
    RouteTooLong {
        /// Route length in bytes
        len: usize,
        /// Maximum route length
        max: usize,
    },

    /// Request or response without a correlation id
    #[error("{kind:?} message requires a non-zero id")]
    MissingId {
        /// Message type that needs the id
        kind: MessageType,
    },

    /// Request, notify or push without a route
    #[error("{kind:?} message requires a route")]
    MissingRoute {
        /// Message type that needs the route
        kind: MessageType,
    },

    /// Route-compressed messages need a route dictionary, which is not
    /// configured
    #[error("compressed routes are not supported")]
    CompressedRoute,

    /// Correlation id varint is truncated or overflows `u64`
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// Route is truncated or not UTF-8
    #[error("invalid route encoding")]
    InvalidRoute,
}
