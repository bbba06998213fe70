use crate::encoding::writer::Writer;
use crate::field::{Endian, Field};
use crate::hci::HCI_COMMAND;
use crate::packet::{Packet, PacketKind};
use crate::types::{MacAddress, Opcode};
use crate::EncodeError;

pub const OCF_LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
pub const OCF_LE_SET_ADVERTISING_DATA: u16 = 0x0008;
pub const OCF_LE_SET_ADVERTISE_ENABLE: u16 = 0x000A;
pub const OCF_LE_SET_SCAN_PARAMETERS: u16 = 0x000B;
pub const OCF_LE_SET_SCAN_ENABLE: u16 = 0x000C;

/// Controller time unit for scan and advertising intervals.
pub const INTERVAL_UNIT_MS: f64 = 0.625;
pub const MIN_SCAN_INTERVAL_MS: f64 = 2.5;
pub const MIN_ADVERTISING_INTERVAL_MS: f64 = 20.0;
pub const MAX_INTERVAL_MS: f64 = 10240.0;

/// Most advertising data a legacy advertisement can carry.
pub const MAX_ADVERTISING_DATA_LEN: usize = 31;

const SCAN_TYPE_LABELS: &[(u8, &str)] = &[(0, "Passive"), (1, "Active")];
const ADDRESS_TYPE_LABELS: &[(u8, &str)] = &[(0, "public"), (1, "random")];
const SCAN_FILTER_LABELS: &[(u8, &str)] = &[(0, "accept all"), (1, "whitelist only")];
const ADV_TYPE_LABELS: &[(u8, &str)] = &[
    (0, "ADV_IND"),
    (1, "ADV_DIRECT_IND high duty"),
    (2, "ADV_SCAN_IND"),
    (3, "ADV_NONCONN_IND"),
    (4, "ADV_DIRECT_IND low duty"),
];
const ADV_FILTER_LABELS: &[(u8, &str)] = &[
    (0, "scan any, connect any"),
    (1, "scan whitelist, connect any"),
    (2, "scan any, connect whitelist"),
    (3, "scan whitelist, connect whitelist"),
];
const CHANNEL_MAP_LABELS: &[&str; 8] = &[
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Channel 39",
    "Channel 38",
    "Channel 37",
];

/// An LE controller command that can be framed for the HCI transport.
///
/// Implementors describe their parameters as fields; framing (tag, opcode,
/// parameter length) is shared.
pub trait HciCommand {
    const OPCODE: Opcode;
    const NAME: &'static str;

    fn parameters(&self) -> Result<Vec<Field>, EncodeError>;

    fn to_packet(&self) -> Result<Packet, EncodeError> {
        let params = self.parameters()?;
        let len: usize = params.iter().map(Field::byte_len).sum();
        let len = u8::try_from(len).map_err(|_| EncodeError::ValueOutOfRange)?;
        let mut packet = Packet::new(Self::NAME, PacketKind::Command)
            .with_header(HCI_COMMAND)
            .with_child(Field::opcode("command", Self::OPCODE))
            .with_child(Field::u8("length", len));
        for param in params {
            packet.push(param);
        }
        Ok(packet)
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        self.to_packet()?.encode(w)
    }

    fn to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        self.to_packet()?.to_vec()
    }
}

const fn le(ocf: u16) -> Opcode {
    Opcode::new(Opcode::OGF_LE_CONTROLLER, ocf)
}

/// Clamps `ms` into `[min_ms, MAX_INTERVAL_MS]` and converts to 0.625 ms units.
pub fn interval_units(ms: f64, min_ms: f64) -> u16 {
    let ms = if ms.is_nan() { min_ms } else { ms };
    (ms.clamp(min_ms, MAX_INTERVAL_MS) / INTERVAL_UNIT_MS).round() as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanType {
    #[default]
    Passive,
    Active,
}

impl ScanType {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Passive => 0,
            Self::Active => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressType {
    #[default]
    Public,
    Random,
}

impl AddressType {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Random => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdvertisingType {
    /// Connectable undirected.
    AdvInd,
    AdvDirectIndHighDuty,
    /// Scannable undirected.
    AdvScanInd,
    /// Non-connectable undirected, what a beacon uses.
    #[default]
    AdvNonconnInd,
    AdvDirectIndLowDuty,
}

impl AdvertisingType {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::AdvInd => 0,
            Self::AdvDirectIndHighDuty => 1,
            Self::AdvScanInd => 2,
            Self::AdvNonconnInd => 3,
            Self::AdvDirectIndLowDuty => 4,
        }
    }
}

/// LE Set Scan Enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeSetScanEnable {
    pub enable: bool,
    pub filter_duplicates: bool,
}

impl LeSetScanEnable {
    pub const fn start() -> Self {
        Self {
            enable: true,
            filter_duplicates: false,
        }
    }

    pub const fn stop() -> Self {
        Self {
            enable: false,
            filter_duplicates: false,
        }
    }
}

impl HciCommand for LeSetScanEnable {
    const OPCODE: Opcode = le(OCF_LE_SET_SCAN_ENABLE);
    const NAME: &'static str = "LE Set Scan Enable";

    fn parameters(&self) -> Result<Vec<Field>, EncodeError> {
        Ok(vec![
            Field::bool("enable", self.enable),
            Field::bool("filter", self.filter_duplicates),
        ])
    }
}

/// LE Set Scan Parameters, with intervals given in milliseconds.
///
/// Interval and window are clamped to 2.5..=10240 ms and rounded to 0.625 ms
/// units on encode; the window never exceeds the interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanParameters {
    pub scan_type: ScanType,
    pub interval_ms: f64,
    pub window_ms: f64,
    pub own_address_type: AddressType,
    pub filter_policy: u8,
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            scan_type: ScanType::Passive,
            interval_ms: 10.0,
            window_ms: 750.0,
            own_address_type: AddressType::Public,
            filter_policy: 0,
        }
    }
}

impl ScanParameters {
    pub fn interval_units(&self) -> u16 {
        interval_units(self.interval_ms, MIN_SCAN_INTERVAL_MS)
    }

    pub fn window_units(&self) -> u16 {
        interval_units(self.window_ms, MIN_SCAN_INTERVAL_MS).min(self.interval_units())
    }
}

impl HciCommand for ScanParameters {
    const OPCODE: Opcode = le(OCF_LE_SET_SCAN_PARAMETERS);
    const NAME: &'static str = "LE Set Scan Parameters";

    fn parameters(&self) -> Result<Vec<Field>, EncodeError> {
        Ok(vec![
            Field::enumerated("scan type", self.scan_type.to_u8(), SCAN_TYPE_LABELS),
            Field::u16("interval", self.interval_units(), Endian::Little),
            Field::u16("window", self.window_units(), Endian::Little),
            Field::enumerated(
                "own addr type",
                self.own_address_type.to_u8(),
                ADDRESS_TYPE_LABELS,
            ),
            Field::enumerated("filter policy", self.filter_policy, SCAN_FILTER_LABELS),
        ])
    }
}

/// LE Set Advertise Enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeSetAdvertiseEnable {
    pub enable: bool,
}

impl HciCommand for LeSetAdvertiseEnable {
    const OPCODE: Opcode = le(OCF_LE_SET_ADVERTISE_ENABLE);
    const NAME: &'static str = "LE Set Advertise Enable";

    fn parameters(&self) -> Result<Vec<Field>, EncodeError> {
        Ok(vec![Field::bool("enable", self.enable)])
    }
}

/// LE Set Advertising Parameters, with intervals given in milliseconds.
///
/// Min and max are clamped to 20..=10240 ms and max is raised to min when it
/// would otherwise be smaller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdvertisingParameters {
    pub interval_min_ms: f64,
    pub interval_max_ms: f64,
    pub advertising_type: AdvertisingType,
    pub own_address_type: AddressType,
    pub peer_address_type: AddressType,
    pub peer_address: MacAddress,
    /// Bit 0 enables channel 37, bit 1 channel 38, bit 2 channel 39.
    pub channel_map: u8,
    pub filter_policy: u8,
}

impl Default for AdvertisingParameters {
    fn default() -> Self {
        Self {
            interval_min_ms: 500.0,
            interval_max_ms: 750.0,
            advertising_type: AdvertisingType::AdvNonconnInd,
            own_address_type: AddressType::Public,
            peer_address_type: AddressType::Public,
            peer_address: MacAddress::default(),
            channel_map: 0x07,
            filter_policy: 0,
        }
    }
}

impl AdvertisingParameters {
    /// Both bounds set to the same interval.
    pub fn with_interval(interval_ms: f64) -> Self {
        Self {
            interval_min_ms: interval_ms,
            interval_max_ms: interval_ms,
            ..Self::default()
        }
    }

    pub fn interval_min_units(&self) -> u16 {
        interval_units(self.interval_min_ms, MIN_ADVERTISING_INTERVAL_MS)
    }

    pub fn interval_max_units(&self) -> u16 {
        interval_units(self.interval_max_ms, MIN_ADVERTISING_INTERVAL_MS)
            .max(self.interval_min_units())
    }
}

impl HciCommand for AdvertisingParameters {
    const OPCODE: Opcode = le(OCF_LE_SET_ADVERTISING_PARAMETERS);
    const NAME: &'static str = "LE Set Advertising Parameters";

    fn parameters(&self) -> Result<Vec<Field>, EncodeError> {
        Ok(vec![
            Field::u16("adv minimum", self.interval_min_units(), Endian::Little),
            Field::u16("adv maximum", self.interval_max_units(), Endian::Little),
            Field::enumerated("adv type", self.advertising_type.to_u8(), ADV_TYPE_LABELS),
            Field::enumerated(
                "own addr type",
                self.own_address_type.to_u8(),
                ADDRESS_TYPE_LABELS,
            ),
            Field::enumerated(
                "peer addr type",
                self.peer_address_type.to_u8(),
                ADDRESS_TYPE_LABELS,
            ),
            Field::mac("peer", self.peer_address),
            Field::bit_field("channel", self.channel_map, CHANNEL_MAP_LABELS),
            Field::enumerated("filter policy", self.filter_policy, ADV_FILTER_LABELS),
        ])
    }
}

/// LE Set Advertising Data: a significant-length byte followed by 31 data
/// bytes, zero padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeSetAdvertisingData {
    pub data: Vec<u8>,
}

impl LeSetAdvertisingData {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl HciCommand for LeSetAdvertisingData {
    const OPCODE: Opcode = le(OCF_LE_SET_ADVERTISING_DATA);
    const NAME: &'static str = "LE Set Advertising Data";

    fn parameters(&self) -> Result<Vec<Field>, EncodeError> {
        if self.data.len() > MAX_ADVERTISING_DATA_LEN {
            return Err(EncodeError::InvalidLength);
        }
        let mut padded = self.data.clone();
        padded.resize(MAX_ADVERTISING_DATA_LEN, 0);
        Ok(vec![
            Field::u8("data length", self.data.len() as u8),
            Field::new(
                "data",
                crate::field::FieldValue::Bytes {
                    data: padded,
                    fixed: Some(MAX_ADVERTISING_DATA_LEN),
                },
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_enable_frame() {
        assert_eq!(
            LeSetScanEnable::start().to_vec().unwrap(),
            vec![0x01, 0x0c, 0x20, 0x02, 0x01, 0x00]
        );
        let stop = LeSetScanEnable {
            enable: false,
            filter_duplicates: true,
        };
        assert_eq!(stop.to_vec().unwrap(), vec![0x01, 0x0c, 0x20, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn scan_parameters_clamp_to_legal_range() {
        let low = ScanParameters {
            interval_ms: 1.0,
            window_ms: 1.0,
            ..ScanParameters::default()
        };
        assert_eq!(low.interval_units(), 4);
        let high = ScanParameters {
            interval_ms: 20000.0,
            window_ms: 20000.0,
            ..ScanParameters::default()
        };
        assert_eq!(high.interval_units(), 16384);
        assert_eq!(high.window_units(), 16384);

        let frame = high.to_vec().unwrap();
        assert_eq!(&frame[..4], &[0x01, 0x0b, 0x20, 0x07]);
        assert_eq!(&frame[5..9], &[0x00, 0x40, 0x00, 0x40]);
    }

    #[test]
    fn scan_window_never_exceeds_interval() {
        let params = ScanParameters::default();
        assert_eq!(params.interval_units(), 16);
        assert_eq!(params.window_units(), 16);
        let rounded = ScanParameters {
            interval_ms: 100.3,
            window_ms: 50.0,
            ..ScanParameters::default()
        };
        assert_eq!(rounded.interval_units(), 160);
        assert_eq!(rounded.window_units(), 80);
    }

    #[test]
    fn advertising_parameters_keep_max_above_min() {
        let params = AdvertisingParameters {
            interval_min_ms: 1000.0,
            interval_max_ms: 5.0,
            ..AdvertisingParameters::default()
        };
        assert_eq!(params.interval_min_units(), 1600);
        assert_eq!(params.interval_max_units(), 1600);

        let frame = AdvertisingParameters::default().to_vec().unwrap();
        assert_eq!(
            frame,
            vec![
                0x01, 0x06, 0x20, 0x0f, 0x20, 0x03, 0xb0, 0x04, 0x03, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x07, 0x00,
            ]
        );
    }

    #[test]
    fn advertising_data_is_padded_to_31_bytes() {
        let frame = LeSetAdvertisingData::new(vec![0x02, 0x01, 0x1a])
            .to_vec()
            .unwrap();
        assert_eq!(frame.len(), 4 + 32);
        assert_eq!(&frame[..8], &[0x01, 0x08, 0x20, 0x20, 0x03, 0x02, 0x01, 0x1a]);
        assert!(frame[8..].iter().all(|b| *b == 0));

        let too_long = LeSetAdvertisingData::new(vec![0u8; 32]);
        assert_eq!(too_long.to_vec().unwrap_err(), EncodeError::InvalidLength);
    }

    #[test]
    fn advertise_enable_display() {
        let packet = LeSetAdvertiseEnable { enable: true }.to_packet().unwrap();
        assert_eq!(packet.kind(), PacketKind::Command);
        assert_eq!(packet.first_field("enable").unwrap().as_bool(), Some(true));
        assert!(packet.display(0).starts_with("LE Set Advertise Enable:\n"));
    }
}
