use crate::beacons::{be_i16, be_u16, manufacturer_data, peer, rssi, Recognition, Recognizer};
use crate::packet::Packet;
use crate::types::MacAddress;

/// Blue Maestro Limited company identifier (307).
pub const BLUEMAESTRO_COMPANY_ID: u16 = 0x0133;

const PAYLOAD_LEN: usize = 12;

/// A Tempo Disc reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlueMaestroRecord {
    pub mac: Option<MacAddress>,
    pub rssi: Option<i8>,
    pub version: u8,
    pub battery_percent: u8,
    /// Seconds between logged samples.
    pub logging_interval: u16,
    pub sample_count: u16,
    pub temperature: f64,
    pub humidity: f64,
    pub dew_point: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlueMaestro;

impl Recognizer for BlueMaestro {
    type Record = BlueMaestroRecord;

    fn recognize(&self, event: &Packet) -> Recognition<BlueMaestroRecord> {
        let Some((_, p)) = manufacturer_data(event)
            .into_iter()
            .find(|(id, _)| *id == BLUEMAESTRO_COMPANY_ID)
        else {
            return Recognition::NotThisFormat;
        };
        if p.len() < PAYLOAD_LEN {
            return Recognition::Malformed("BlueMaestro payload too short");
        }
        let tenths = |at| be_i16(p, at) as f64 / 10.0;
        Recognition::Matched(BlueMaestroRecord {
            mac: peer(event),
            rssi: rssi(event),
            version: p[0],
            battery_percent: p[1],
            logging_interval: be_u16(p, 2),
            sample_count: be_u16(p, 4),
            temperature: tenths(6),
            humidity: tenths(8),
            dew_point: tenths(10),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacons::test_support::{close, hex, report_event};

    #[test]
    fn tempo_disc_reading() {
        let chunks = hex("02 01 06 0f ff 33 01 17 64 00 3c 01 f4 00 e6 02 0d ff f6");
        let ev = report_event([0x01, 0x02, 0x03, 0x04, 0x05, 0x06], &chunks, -72);
        let record = BlueMaestro.decode(&ev).unwrap();
        assert_eq!(record.version, 23);
        assert_eq!(record.battery_percent, 100);
        assert_eq!(record.logging_interval, 60);
        assert_eq!(record.sample_count, 500);
        assert!(close(record.temperature, 23.0));
        assert!(close(record.humidity, 52.5));
        assert!(close(record.dew_point, -1.0));
        assert_eq!(record.rssi, Some(-72));
    }

    #[test]
    fn other_companies_are_ignored() {
        let chunks = hex("06 ff 99 04 05 12 fc");
        let ev = report_event([0x01, 0x02, 0x03, 0x04, 0x05, 0x06], &chunks, -72);
        assert_eq!(BlueMaestro.recognize(&ev), Recognition::NotThisFormat);
    }
}
