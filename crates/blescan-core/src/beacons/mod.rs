//! Vendor beacon formats layered on the tree query interface.
//!
//! Every recognizer takes a decoded event tree and answers with a
//! [`Recognition`]: the typed record, "not this format", or "this format but
//! the payload is broken". None of them walk EIR chunks themselves; they ask
//! the tree for `"peer"`, `"rssi"`, service data and manufacturer data.

use std::borrow::Cow;

use crate::packet::{Node, Packet};
use crate::types::{MacAddress, Uuid};

pub mod atc;
pub mod bluemaestro;
pub mod eddystone;
pub mod ruuvi;
pub mod thermobeacon;
pub mod tilt;

pub use atc::{Atc, AtcRecord};
pub use bluemaestro::{BlueMaestro, BlueMaestroRecord};
pub use eddystone::{expand_eddystone, Eddystone, EddystoneFrame, EddystoneRecord};
pub use ruuvi::{Ruuvi, RuuviRecord};
pub use thermobeacon::{ThermoBeacon, ThermoBeaconRecord};
pub use tilt::{Tilt, TiltRecord};

/// Outcome of matching a tree against one beacon format.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition<T> {
    Matched(T),
    /// The tree carries no advertisement of this format.
    NotThisFormat,
    /// The advertisement claims this format but its payload cannot be read.
    Malformed(&'static str),
}

impl<T> Recognition<T> {
    pub fn matched(self) -> Option<T> {
        match self {
            Self::Matched(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Recognition<U> {
        match self {
            Self::Matched(record) => Recognition::Matched(f(record)),
            Self::NotThisFormat => Recognition::NotThisFormat,
            Self::Malformed(reason) => Recognition::Malformed(reason),
        }
    }
}

/// A beacon format interpreter.
pub trait Recognizer {
    type Record;

    fn recognize(&self, event: &Packet) -> Recognition<Self::Record>;

    fn decode(&self, event: &Packet) -> Option<Self::Record> {
        self.recognize(event).matched()
    }
}

/// Address of the advertiser: the last `"peer"` field.
pub fn peer(event: &Packet) -> Option<MacAddress> {
    event.last_field("peer").and_then(|f| f.as_mac())
}

/// Received signal strength: the last `"rssi"` field.
pub fn rssi(event: &Packet) -> Option<i8> {
    event
        .last_field("rssi")
        .and_then(|f| f.as_i32())
        .and_then(|v| i8::try_from(v).ok())
}

/// Wire bytes of a payload node, whether still opaque or already expanded.
pub(crate) fn node_bytes(node: &Node) -> Option<Cow<'_, [u8]>> {
    match node {
        Node::Field(f) => f.as_bytes().map(Cow::Borrowed),
        Node::Packet(p) => p.to_vec().ok().map(Cow::Owned),
    }
}

/// Every service-data chunk as `(uuid, payload)`, in tree order.
pub fn service_data(event: &Packet) -> Vec<(&Uuid, Option<Cow<'_, [u8]>>)> {
    event
        .packets_named("Advertised Data")
        .into_iter()
        .filter_map(|chunk| {
            let uuid = chunk.first_field("Service Data uuid")?.as_uuid()?;
            let payload = chunk
                .query("Adv Payload")
                .into_iter()
                .next()
                .and_then(node_bytes);
            Some((uuid, payload))
        })
        .collect()
}

/// Every manufacturer-specific chunk as `(company id, payload)`, in tree order.
pub fn manufacturer_data(event: &Packet) -> Vec<(u16, &[u8])> {
    event
        .packets_named("Manufacturer Specific Data")
        .into_iter()
        .filter_map(|chunk| {
            let id = chunk.first_field("Manufacturer ID")?.as_u32()?;
            let payload = chunk
                .first_field("Payload")
                .and_then(|f| f.as_bytes())
                .unwrap_or(&[]);
            Some((id as u16, payload))
        })
        .collect()
}

/// The beacon formats this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BeaconKind {
    Eddystone,
    Ruuvi,
    Atc,
    ThermoBeacon,
    Tilt,
    BlueMaestro,
}

impl BeaconKind {
    pub const ALL: [BeaconKind; 6] = [
        Self::Eddystone,
        Self::Ruuvi,
        Self::Atc,
        Self::ThermoBeacon,
        Self::Tilt,
        Self::BlueMaestro,
    ];

    pub fn recognize(self, event: &Packet) -> Recognition<BeaconRecord> {
        match self {
            Self::Eddystone => Eddystone.recognize(event).map(BeaconRecord::Eddystone),
            Self::Ruuvi => Ruuvi.recognize(event).map(BeaconRecord::Ruuvi),
            Self::Atc => Atc.recognize(event).map(BeaconRecord::Atc),
            Self::ThermoBeacon => ThermoBeacon.recognize(event).map(BeaconRecord::ThermoBeacon),
            Self::Tilt => Tilt.recognize(event).map(BeaconRecord::Tilt),
            Self::BlueMaestro => BlueMaestro.recognize(event).map(BeaconRecord::BlueMaestro),
        }
    }
}

/// A record produced by any recognizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "format", rename_all = "snake_case"))]
pub enum BeaconRecord {
    Eddystone(EddystoneRecord),
    Ruuvi(RuuviRecord),
    Atc(AtcRecord),
    ThermoBeacon(ThermoBeaconRecord),
    Tilt(TiltRecord),
    BlueMaestro(BlueMaestroRecord),
}

impl BeaconRecord {
    pub fn kind(&self) -> BeaconKind {
        match self {
            Self::Eddystone(_) => BeaconKind::Eddystone,
            Self::Ruuvi(_) => BeaconKind::Ruuvi,
            Self::Atc(_) => BeaconKind::Atc,
            Self::ThermoBeacon(_) => BeaconKind::ThermoBeacon,
            Self::Tilt(_) => BeaconKind::Tilt,
            Self::BlueMaestro(_) => BeaconKind::BlueMaestro,
        }
    }
}

/// Tries `kinds` in order and returns the first match.
///
/// When nothing matches, the first malformed verdict (if any) is returned so
/// callers can tell a broken beacon from an unrelated advertisement.
pub fn recognize_any(event: &Packet, kinds: &[BeaconKind]) -> Recognition<BeaconRecord> {
    let mut verdict = Recognition::NotThisFormat;
    for kind in kinds {
        match kind.recognize(event) {
            Recognition::Matched(record) => return Recognition::Matched(record),
            Recognition::Malformed(reason) => {
                log::debug!("{kind:?} advertisement is malformed: {reason}");
                if matches!(verdict, Recognition::NotThisFormat) {
                    verdict = Recognition::Malformed(reason);
                }
            }
            Recognition::NotThisFormat => {}
        }
    }
    verdict
}

/// Reads a big-endian `u16` at `at`; callers check the length first.
pub(crate) fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

pub(crate) fn be_i16(data: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([data[at], data[at + 1]])
}

pub(crate) fn le_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

pub(crate) fn le_i16(data: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([data[at], data[at + 1]])
}

pub(crate) fn le_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::hci::event::decode_event;
    use crate::packet::Packet;

    /// Parses whitespace-separated hex octets.
    pub fn hex(s: &str) -> Vec<u8> {
        s.split_whitespace()
            .map(|b| u8::from_str_radix(b, 16).unwrap())
            .collect()
    }

    pub fn event(s: &str) -> Packet {
        decode_event(&hex(s)).unwrap()
    }

    /// Builds an advertising-report event around raw EIR chunks.
    pub fn report_event(mac_wire: [u8; 6], chunks: &[u8], rssi: i8) -> Packet {
        let mut body = vec![0x02, 0x01, 0x00, 0x00];
        body.extend_from_slice(&mac_wire);
        body.push(chunks.len() as u8);
        body.extend_from_slice(chunks);
        body.push(rssi as u8);
        let mut frame = vec![0x04, 0x3e, body.len() as u8];
        frame.extend(body);
        decode_event(&frame).unwrap()
    }

    pub fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{event, report_event};
    use super::*;

    const ATC: &str = "04 3e 1d 02 01 00 00 38 52 40 38 c1 a4 11 10 16 1a 18 a4 c1 38 40 52 38 00 f3 25 55 0b 9f de db";

    #[test]
    fn helpers_find_peer_rssi_and_service_data() {
        let ev = event(ATC);
        assert_eq!(peer(&ev).unwrap().to_string(), "a4:c1:38:40:52:38");
        assert_eq!(rssi(&ev), Some(-37));
        let sd = service_data(&ev);
        assert_eq!(sd.len(), 1);
        assert!(sd[0].0.is_u16(0x181a));
        assert_eq!(sd[0].1.as_deref().map(<[u8]>::len), Some(13));
        assert!(manufacturer_data(&ev).is_empty());
    }

    #[test]
    fn peer_is_the_last_address_in_the_tree() {
        use crate::field::Field;
        use crate::packet::PacketKind;
        let first = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let last = MacAddress::new([6, 5, 4, 3, 2, 1]);
        let tree = Packet::new("Report", PacketKind::AdvertisingReport)
            .with_child(Field::mac("peer", first))
            .with_child(Field::mac("peer", last));
        assert_eq!(peer(&tree), Some(last));
    }

    #[test]
    fn recognize_any_reports_first_match() {
        let ev = event(ATC);
        let record = recognize_any(&ev, &BeaconKind::ALL).matched().unwrap();
        assert_eq!(record.kind(), BeaconKind::Atc);
        assert_eq!(
            recognize_any(&ev, &[BeaconKind::Tilt, BeaconKind::Eddystone]),
            Recognition::NotThisFormat
        );
    }

    #[test]
    fn recognize_any_surfaces_malformed() {
        // BlueMaestro company id with a payload far too short
        let ev = report_event([1, 2, 3, 4, 5, 6], &[0x04, 0xff, 0x33, 0x01, 0x0d], -60);
        assert!(matches!(
            recognize_any(&ev, &BeaconKind::ALL),
            Recognition::Malformed(_)
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn records_serialize_tagged_by_format() {
        let record = recognize_any(&event(ATC), &BeaconKind::ALL).matched().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["format"], "atc");
        assert_eq!(json["humidity"], 37);
        assert_eq!(json["battery_mv"], 2975);
        let back: BeaconRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
