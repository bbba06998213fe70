#![no_main]

use blescan_datalink::HciFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: [u8; HciFilter::LEN]| {
    let filter = HciFilter::from_bytes(&data);
    assert_eq!(filter.to_bytes(), data);
    for code in 0..=u8::MAX {
        let _ = filter.allows_event(code);
    }
});
