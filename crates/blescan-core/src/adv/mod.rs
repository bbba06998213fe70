//! LE advertising-report decoding.
//!
//! A report body is a handful of fixed fields followed by length-prefixed
//! EIR chunks and, usually, one trailing RSSI byte. [`report`] walks the
//! chunks; [`eir`] names the chunk types.

pub mod eir;
pub mod report;

pub use eir::EirType;
pub use report::{decode_advertising_report, TrailingBytePolicy};
pub use crate::packet::Truncation;
