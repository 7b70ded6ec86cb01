//! Arbitrary text frames must decode or fail cleanly, and anything that
//! decodes must survive re-encoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mingle_proto::EnginePacket;

fuzz_target!(|frame: &str| {
    let Ok(packet) = EnginePacket::decode(frame) else {
        return;
    };
    if matches!(packet, EnginePacket::Open(_)) {
        return;
    }
    if let Ok(encoded) = packet.encode() {
        let again = EnginePacket::decode(&encoded).expect("re-encoded packet must decode");
        assert_eq!(again, packet);
    }
});
