//! Fuzz target for Message::decode
//!
//! Covers the flag byte, varint id and length-prefixed route with:
//! - Overlong or truncated varints
//! - Route lengths past the end of input
//! - Non-UTF-8 routes
//!
//! Anything that decodes must survive a re-encode and decode unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_proto::Message;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = Message::decode(data) else {
        return;
    };

    // Decode accepts some envelopes encode refuses (id 0, empty route)
    if let Ok(encoded) = message.encode() {
        let again = Message::decode(&encoded).expect("encoded message decodes");
        assert_eq!(again, message);
    }
});
