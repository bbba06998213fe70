use core::fmt;

use crate::beacons::{be_u16, manufacturer_data, peer, rssi, Recognition, Recognizer};
use crate::packet::Packet;
use crate::types::MacAddress;

/// iBeacon type and length, followed by the first two bytes shared by every
/// Tilt UUID.
const TILT_PREFIX: [u8; 4] = [0x02, 0x15, 0xa4, 0x95];
const PAYLOAD_LEN: usize = 23;

/// Colour of the hydrometer, encoded in the fourth byte of its UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TiltColour {
    Red,
    Green,
    Black,
    Purple,
    Orange,
    Blue,
    Yellow,
    Pink,
    Unknown,
}

impl TiltColour {
    pub fn from_uuid(uuid: &[u8; 16]) -> Self {
        if uuid[2] != 0xbb {
            return Self::Unknown;
        }
        match uuid[3] {
            0x10 => Self::Red,
            0x20 => Self::Green,
            0x30 => Self::Black,
            0x40 => Self::Purple,
            0x50 => Self::Orange,
            0x60 => Self::Blue,
            0x70 => Self::Yellow,
            0x80 => Self::Pink,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TiltColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TiltRecord {
    pub mac: Option<MacAddress>,
    pub rssi: Option<i8>,
    pub uuid: [u8; 16],
    pub colour: TiltColour,
    /// Temperature in degrees Fahrenheit.
    pub major: u16,
    /// Specific gravity times 1000.
    pub minor: u16,
    /// Calibrated power, or weeks since the battery was changed.
    pub tx_power: i8,
}

impl TiltRecord {
    pub fn temperature_celsius(&self) -> f64 {
        (self.major as f64 - 32.0) * 5.0 / 9.0
    }

    pub fn specific_gravity(&self) -> f64 {
        self.minor as f64 / 1000.0
    }
}

/// Tilt hydrometers, which advertise as iBeacons.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tilt;

impl Recognizer for Tilt {
    type Record = TiltRecord;

    fn recognize(&self, event: &Packet) -> Recognition<TiltRecord> {
        let Some((_, payload)) = manufacturer_data(event).into_iter().next() else {
            return Recognition::NotThisFormat;
        };
        if !payload.starts_with(&TILT_PREFIX) {
            return Recognition::NotThisFormat;
        }
        if payload.len() < PAYLOAD_LEN {
            return Recognition::Malformed("Tilt iBeacon payload too short");
        }
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&payload[2..18]);
        Recognition::Matched(TiltRecord {
            mac: peer(event),
            rssi: rssi(event),
            colour: TiltColour::from_uuid(&uuid),
            uuid,
            major: be_u16(payload, 18),
            minor: be_u16(payload, 20),
            tx_power: payload[22] as i8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacons::test_support::{close, hex, report_event};

    fn tilt_event(payload: &str) -> Packet {
        let payload = hex(payload);
        let mut chunks = hex("02 01 04");
        chunks.push(payload.len() as u8 + 3);
        chunks.extend([0xff, 0x4c, 0x00]);
        chunks.extend(payload);
        report_event([0x11, 0x22, 0x33, 0x44, 0x55, 0x66], &chunks, -64)
    }

    #[test]
    fn red_tilt() {
        let ev = tilt_event(
            "02 15 a4 95 bb 10 c5 b1 4b 44 b5 12 13 70 f0 2d 74 de 00 44 03 f8 c5",
        );
        let record = Tilt.decode(&ev).unwrap();
        assert_eq!(record.colour, TiltColour::Red);
        assert_eq!(record.major, 68);
        assert_eq!(record.minor, 1016);
        assert_eq!(record.tx_power, -59);
        assert!(close(record.temperature_celsius(), 20.0));
        assert!(close(record.specific_gravity(), 1.016));
        assert_eq!(record.mac.unwrap().to_string(), "66:55:44:33:22:11");
        assert_eq!(record.rssi, Some(-64));
    }

    #[test]
    fn colour_lookup() {
        let mut uuid = [0u8; 16];
        uuid[2] = 0xbb;
        uuid[3] = 0x80;
        assert_eq!(TiltColour::from_uuid(&uuid), TiltColour::Pink);
        uuid[3] = 0x90;
        assert_eq!(TiltColour::from_uuid(&uuid), TiltColour::Unknown);
        uuid[2] = 0xcc;
        uuid[3] = 0x10;
        assert_eq!(TiltColour::from_uuid(&uuid), TiltColour::Unknown);
    }

    #[test]
    fn other_ibeacons_and_short_payloads() {
        let ev = tilt_event("02 15 e2 c5 6d b5 df fb 48 d2 b0 60 d0 f5 a7 10 96 e0 00 01 00 02 c5");
        assert_eq!(Tilt.recognize(&ev), Recognition::NotThisFormat);

        let ev = tilt_event("02 15 a4 95 bb 10 c5 b1");
        assert!(matches!(Tilt.recognize(&ev), Recognition::Malformed(_)));
    }
}
