#![no_main]

use blescan_core::beacons::{expand_eddystone, recognize_any, BeaconKind};
use blescan_core::hci::decode_event;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut event) = decode_event(data) else {
        return;
    };
    let _ = recognize_any(&event, &BeaconKind::ALL);
    let _ = expand_eddystone(&mut event);
    let _ = recognize_any(&event, &BeaconKind::ALL);
});
