use crate::beacons::{le_i16, le_u16, le_u32, manufacturer_data, peer, rssi, Recognition, Recognizer};
use crate::packet::Packet;
use crate::types::MacAddress;

pub const THERMOBEACON_SERVICE: u16 = 0xFFF0;

const CURRENT_LEN: usize = 18;
const EXTREMES_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "frame", rename_all = "snake_case"))]
pub enum ThermoBeaconReading {
    Current {
        battery_mv: u16,
        temperature: f64,
        humidity: f64,
        /// Seconds since power-on.
        counter: u32,
    },
    Extremes {
        max_temperature: f64,
        max_timestamp: u32,
        min_temperature: f64,
        min_timestamp: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermoBeaconRecord {
    pub mac: MacAddress,
    pub rssi: Option<i8>,
    pub reading: ThermoBeaconReading,
}

/// ThermoBeacon hygrometers. The advertiser lists the `ff:f0` service and
/// echoes its address, wire order, in bytes 2..8 of the manufacturer payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermoBeacon;

impl Recognizer for ThermoBeacon {
    type Record = ThermoBeaconRecord;

    fn recognize(&self, event: &Packet) -> Recognition<ThermoBeaconRecord> {
        let advertises_service = event
            .first_field("Incomplete uuids")
            .and_then(|f| f.as_uuid_list())
            .and_then(|list| list.first())
            .is_some_and(|uuid| uuid.is_u16(THERMOBEACON_SERVICE));
        if !advertises_service {
            return Recognition::NotThisFormat;
        }
        let Some(mac) = peer(event) else {
            return Recognition::NotThisFormat;
        };
        let Some((_, payload)) = manufacturer_data(event).into_iter().next() else {
            return Recognition::NotThisFormat;
        };
        if payload.get(2..8) != Some(&mac.to_wire()[..]) {
            return Recognition::NotThisFormat;
        }

        let t16 = |at| le_i16(payload, at) as f64 / 16.0;
        let reading = match payload.len() {
            CURRENT_LEN => ThermoBeaconReading::Current {
                battery_mv: le_u16(payload, 8),
                temperature: t16(10),
                humidity: t16(12),
                counter: le_u32(payload, 14),
            },
            EXTREMES_LEN => ThermoBeaconReading::Extremes {
                max_temperature: t16(8),
                max_timestamp: le_u32(payload, 10),
                min_temperature: t16(14),
                min_timestamp: le_u32(payload, 16),
            },
            _ => return Recognition::Malformed("unexpected ThermoBeacon payload length"),
        };
        Recognition::Matched(ThermoBeaconRecord {
            mac,
            rssi: rssi(event),
            reading,
        })
    }
}
