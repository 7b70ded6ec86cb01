//! Event packets from the server: name extraction and routing lookup never
//! panic on hostile input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mingle_proto::{InboundEvent, SocketPacket};

fuzz_target!(|body: &str| {
    if let Ok(packet) = SocketPacket::decode(body)
        && let Ok((name, payload)) = packet.into_event()
    {
        let _ = InboundEvent::from_wire(&name, payload);
    }
});
