//! Bluetooth LE HCI frame decoding and encoding in pure Rust.
//!
//! `blescan-core` turns raw HCI event buffers into a tree of self-describing
//! fields, lets callers query that tree by field name or shape, and layers
//! beacon-format recognizers (Eddystone, Ruuvi, ATC thermometer, ThermoBeacon,
//! Tilt, BlueMaestro) on top of it. It also builds the LE command frames used
//! to drive scanning and advertising.
//!
//! ```
//! use blescan_core::hci::event::decode_event;
//! use blescan_core::beacons::{eddystone::Eddystone, Recognizer};
//!
//! let frame = [
//!     0x04, 0x3e, 0x29, 0x02, 0x01, 0x03, 0x01, 0xdc, 0x29, 0x65, 0x90, 0x55, 0xf1, 0x1d,
//!     0x02, 0x01, 0x06, 0x03, 0x03, 0xaa, 0xfe, 0x15, 0x16, 0xaa, 0xfe, 0x10, 0xf6, 0x03,
//!     0x6d, 0x61, 0x6b, 0x65, 0x63, 0x6f, 0x64, 0x65, 0x00, 0x23, 0x61, 0x62, 0x6f, 0x75,
//!     0x74, 0xb5,
//! ];
//! let event = decode_event(&frame).unwrap();
//! let beacon = Eddystone.decode(&event).unwrap();
//! assert_eq!(beacon.rssi, Some(-75));
//! ```
//!
//! # Feature flags
//!
//! - **`serde`**: derives `Serialize`/`Deserialize` on addresses, parameters and beacon records.
//! - **`defmt`**: derives `defmt::Format` on the wire-level code enums.

/// Advertising-report EIR chunk decoding.
pub mod adv;
/// Vendor beacon-format recognizers built on the tree query interface.
pub mod beacons;
/// Zero-copy reader and bounded writer used by every codec.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Typed, self-describing binary fields.
pub mod field;
/// HCI command encoder and event decoder.
pub mod hci;
/// Ordered field containers and the tree query interface.
pub mod packet;
/// Value types shared by fields and records: MAC addresses, UUIDs, opcodes.
pub mod types;

pub use error::{DecodeError, EncodeError};
pub use field::{Field, FieldKind, FieldValue};
pub use packet::{Node, Packet, PacketKind, Selector};
