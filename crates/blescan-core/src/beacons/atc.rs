use crate::beacons::{be_i16, be_u16, peer, rssi, service_data, Recognition, Recognizer};
use crate::packet::Packet;
use crate::types::{MacAddress, Uuid};

const PAYLOAD_LEN: usize = 13;

/// Reading from a thermometer running the ATC custom firmware.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtcRecord {
    pub mac: MacAddress,
    pub rssi: Option<i8>,
    pub temperature: f64,
    pub humidity: u8,
    pub battery_percent: u8,
    pub battery_mv: u16,
    pub counter: u8,
}

impl AtcRecord {
    pub fn battery_volts(&self) -> f64 {
        self.battery_mv as f64 / 1000.0
    }
}

/// Environmental-sensing service data whose payload opens with the
/// advertiser's own address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Atc;

impl Recognizer for Atc {
    type Record = AtcRecord;

    fn recognize(&self, event: &Packet) -> Recognition<AtcRecord> {
        let Some(mac) = peer(event) else {
            return Recognition::NotThisFormat;
        };
        let Some(payload) = service_data(event)
            .into_iter()
            .find(|(uuid, _)| uuid.is_u16(Uuid::ENVIRONMENTAL_SENSING))
            .and_then(|(_, payload)| payload)
        else {
            return Recognition::NotThisFormat;
        };
        if !mac.matches_display_bytes(&payload) {
            return Recognition::NotThisFormat;
        }
        if payload.len() < PAYLOAD_LEN {
            return Recognition::Malformed("ATC payload too short");
        }
        Recognition::Matched(AtcRecord {
            mac,
            rssi: rssi(event),
            temperature: be_i16(&payload, 6) as f64 / 10.0,
            humidity: payload[8],
            battery_percent: payload[9],
            battery_mv: be_u16(&payload, 10),
            counter: payload[12],
        })
    }
}
