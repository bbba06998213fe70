//! HCI framing: outbound LE commands and the inbound event decoder.

pub mod command;
pub mod event;

/// Packet-type tag of an HCI command frame.
pub const HCI_COMMAND: u8 = 0x01;
/// Packet-type tag of an HCI event frame.
pub const HCI_EVENT: u8 = 0x04;

pub const EVENT_COMMAND_COMPLETE: u8 = 0x0E;
pub const EVENT_LE_META: u8 = 0x3E;
pub const LE_SUBEVENT_ADVERTISING_REPORT: u8 = 0x02;

pub use command::{
    AddressType, AdvertisingParameters, AdvertisingType, HciCommand, LeSetAdvertiseEnable,
    LeSetAdvertisingData, LeSetScanEnable, ScanParameters, ScanType,
};
pub use event::{decode_event, EventDecoder};
