/// Bounds-checked cursor over a received frame.
pub mod reader;
/// Bounds-checked cursor filling a caller-owned buffer.
pub mod writer;

/// Byte order of a multi-byte value.
///
/// HCI parameters are little-endian; most vendor beacon payloads are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endian {
    Big,
    Little,
}
