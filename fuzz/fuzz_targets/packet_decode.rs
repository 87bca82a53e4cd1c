//! Fuzz target for Packet::decode
//!
//! Feeds arbitrary bytes to the single-frame decoder to find:
//! - Parser panics
//! - Length fields that read past the buffer
//! - Unknown types slipping through
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_proto::{HEADER_SIZE, Packet};

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = Packet::decode(data) {
        // Trailing bytes are ignored; the frame itself must re-encode exactly
        let frame_len = HEADER_SIZE + packet.payload.len();
        assert!(frame_len <= data.len());

        let reencoded = packet.encode().expect("decoded packet re-encodes");
        assert_eq!(&reencoded[..], &data[..frame_len]);
    }
});
