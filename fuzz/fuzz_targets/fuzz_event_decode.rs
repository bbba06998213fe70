#![no_main]

use blescan_core::adv::TrailingBytePolicy;
use blescan_core::hci::EventDecoder;
use blescan_core::packet::PacketKind;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for policy in [TrailingBytePolicy::Rssi, TrailingBytePolicy::Opaque] {
        let Ok(event) = EventDecoder::new(policy).decode_frame(data) else {
            continue;
        };
        let _ = event.display(0);
        let _ = event.packets(PacketKind::AdvertisingReport);
        // a tree that decoded without truncation re-encodes to its input
        if event.find_truncation().is_none() {
            if let Ok(bytes) = event.to_vec() {
                assert_eq!(bytes.as_slice(), &data[..bytes.len()]);
            }
        }
    }
});
