use blescan_core::beacons::eddystone::{Eddystone, EddystoneFrame};
use blescan_core::beacons::{
    expand_eddystone, recognize_any, Atc, BeaconKind, BeaconRecord, Recognizer, Ruuvi,
};
use blescan_core::encoding::writer::Writer;
use blescan_core::hci::event::decode_event;
use blescan_core::hci::{
    AdvertisingParameters, HciCommand, LeSetAdvertiseEnable, LeSetAdvertisingData,
    LeSetScanEnable, ScanParameters,
};
use blescan_core::types::MacAddress;
use blescan_core::PacketKind;

const ATC_FRAME: [u8; 32] = [
    0x04, 0x3e, 0x1d, 0x02, 0x01, 0x00, 0x00, 0x38, 0x52, 0x40, 0x38, 0xc1, 0xa4, 0x11, 0x10,
    0x16, 0x1a, 0x18, 0xa4, 0xc1, 0x38, 0x40, 0x52, 0x38, 0x00, 0xf3, 0x25, 0x55, 0x0b, 0x9f,
    0xde, 0xdb,
];

const EDDYSTONE_URL_FRAME: [u8; 44] = [
    0x04, 0x3e, 0x29, 0x02, 0x01, 0x03, 0x01, 0xdc, 0x29, 0x65, 0x90, 0x55, 0xf1, 0x1d, 0x02,
    0x01, 0x06, 0x03, 0x03, 0xaa, 0xfe, 0x15, 0x16, 0xaa, 0xfe, 0x10, 0xf6, 0x03, 0x6d, 0x61,
    0x6b, 0x65, 0x63, 0x6f, 0x64, 0x65, 0x00, 0x23, 0x61, 0x62, 0x6f, 0x75, 0x74, 0xb5,
];

#[test]
fn scan_enable_frame_matches_fixture() {
    let mut buf = [0u8; 16];
    let mut w = Writer::new(&mut buf);
    LeSetScanEnable::start().encode(&mut w).unwrap();
    assert_eq!(w.as_written(), &[0x01, 0x0c, 0x20, 0x02, 0x01, 0x00]);

    assert_eq!(
        LeSetScanEnable::stop().to_vec().unwrap(),
        vec![0x01, 0x0c, 0x20, 0x02, 0x00, 0x00]
    );
}

#[test]
fn scan_parameters_frame_matches_fixture() {
    let params = ScanParameters {
        interval_ms: 100.0,
        window_ms: 50.0,
        ..ScanParameters::default()
    };
    assert_eq!(
        params.to_vec().unwrap(),
        vec![0x01, 0x0b, 0x20, 0x07, 0x00, 0xa0, 0x00, 0x50, 0x00, 0x00, 0x00]
    );
}

#[test]
fn advertising_sequence_frames_match_fixture() {
    assert_eq!(
        LeSetAdvertiseEnable { enable: false }.to_vec().unwrap(),
        vec![0x01, 0x0a, 0x20, 0x01, 0x00]
    );

    // 100 ms is 160 slots of 0.625 ms
    let params = AdvertisingParameters::with_interval(100.0).to_vec().unwrap();
    assert_eq!(&params[..8], &[0x01, 0x06, 0x20, 0x0f, 0xa0, 0x00, 0xa0, 0x00]);

    let url = EddystoneFrame::Url {
        tx_power: -10,
        url: "https://makecode.com/#about".to_owned(),
    };
    let data = url.to_advertising_data().unwrap();
    assert_eq!(
        data,
        vec![
            0x02, 0x01, 0x1a, 0x03, 0x03, 0xaa, 0xfe, 0x15, 0x16, 0xaa, 0xfe, 0x10, 0xf6, 0x03,
            0x6d, 0x61, 0x6b, 0x65, 0x63, 0x6f, 0x64, 0x65, 0x00, 0x23, 0x61, 0x62, 0x6f, 0x75,
            0x74,
        ]
    );
    let frame = LeSetAdvertisingData::new(data).to_vec().unwrap();
    assert_eq!(&frame[..5], &[0x01, 0x08, 0x20, 0x20, 0x1d]);
    assert_eq!(frame.len(), 36);

    assert_eq!(
        LeSetAdvertiseEnable { enable: true }.to_vec().unwrap(),
        vec![0x01, 0x0a, 0x20, 0x01, 0x01]
    );
}

#[test]
fn atc_report_tree_and_record() {
    let event = decode_event(&ATC_FRAME).unwrap();
    let peer = event.first_field("peer").unwrap().as_mac().unwrap();
    assert_eq!(peer, "a4:c1:38:40:52:38".parse::<MacAddress>().unwrap());
    assert_eq!(event.packets(PacketKind::AdvertisingReport).len(), 1);
    assert_eq!(event.packets_named("Advertised Data").len(), 1);

    let record = Atc.decode(&event).unwrap();
    assert!((record.temperature - 24.3).abs() < 1e-9);
    assert_eq!(record.humidity, 37);
    assert_eq!(record.battery_percent, 85);
    assert!((record.battery_volts() - 2.975).abs() < 1e-9);
    assert_eq!(record.counter, 222);
    assert_eq!(record.rssi, Some(-37));
}

#[test]
fn eddystone_url_report_is_recognized_and_expanded() {
    let mut event = decode_event(&EDDYSTONE_URL_FRAME).unwrap();
    let record = Eddystone.decode(&event).unwrap();
    assert_eq!(record.mac.unwrap().to_string(), "f1:55:90:65:29:dc");
    assert_eq!(record.tx_power(), Some(-10));
    assert_eq!(record.url(), Some("https://makecode.com/#about"));
    assert_eq!(record.rssi, Some(-75));

    // makecode is not a Ruuvi URL
    assert!(Ruuvi.decode(&event).is_none());
    match recognize_any(&event, &BeaconKind::ALL).matched() {
        Some(BeaconRecord::Eddystone(r)) => assert_eq!(r, record),
        other => panic!("unexpected recognition {other:?}"),
    }

    assert!(expand_eddystone(&mut event).is_matched());
    assert_eq!(event.to_vec().unwrap(), EDDYSTONE_URL_FRAME);
    assert_eq!(
        event.first_field("url").unwrap().as_str(),
        Some("https://makecode.com/#about")
    );
}
