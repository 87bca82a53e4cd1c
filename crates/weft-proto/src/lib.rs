//! Wire formats for the weft server fabric.
//!
//! Two layers, both pure (no I/O):
//!
//! - [`Packet`]: transport framing. A 4-byte header (type + 24-bit length)
//!   followed by the payload. Heartbeats, handshakes and kicks are bare
//!   packets; application traffic travels inside [`PacketType::Data`].
//! - [`Message`]: the logical envelope carried by a data packet. Requests and
//!   responses carry a correlation id, requests, notifies and pushes carry a
//!   route.
//!
//! ```text
//! ┌──────┬────────────┬──────────────────────────────────────────┐
//! │ type │ length(24) │ flag │ id (varint)? │ route? │ payload    │
//! └──────┴────────────┴──────────────────────────────────────────┘
//!   packet header       message (only for PacketType::Data)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod message;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use message::{MAX_ROUTE_LEN, Message, MessageType};
pub use packet::{HEADER_SIZE, MAX_PAYLOAD_SIZE, Packet, PacketDecoder, PacketType, heartbeat_frame};
