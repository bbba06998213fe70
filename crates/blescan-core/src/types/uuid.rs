use core::fmt;
use core::fmt::Write as _;

/// A Bluetooth service UUID of 2, 4 or 16 bytes.
///
/// Bytes are kept in display order (big-endian); advertising data carries
/// them little-endian, so decoding reverses each group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uuid(Vec<u8>);

impl Uuid {
    /// The 16-bit UUID Google registered for Eddystone.
    pub const EDDYSTONE: u16 = 0xFEAA;
    /// The 16-bit Environmental Sensing service UUID used by ATC firmware.
    pub const ENVIRONMENTAL_SENSING: u16 = 0x181A;

    pub fn from_wire(wire: &[u8]) -> Self {
        Self(wire.iter().rev().copied().collect())
    }

    pub fn from_u16(value: u16) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    /// An all-zero UUID of `width` bytes, used as a decode template.
    pub fn zeroed(width: usize) -> Self {
        Self(vec![0; width])
    }

    pub fn to_wire(&self) -> Vec<u8> {
        self.0.iter().rev().copied().collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The 16-bit value of a short UUID; `None` for 32- and 128-bit UUIDs.
    pub fn as_u16(&self) -> Option<u16> {
        match self.0.as_slice() {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    pub fn is_u16(&self, value: u16) -> bool {
        self.as_u16() == Some(value)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex_colon(f, &self.0)
    }
}

/// Writes bytes as lower-case hex octets joined by `:`.
pub(crate) fn write_hex_colon(f: &mut dyn fmt::Write, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_char(':')?;
        }
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Uuid;

    #[test]
    fn reverses_wire_order() {
        let uuid = Uuid::from_wire(&[0xaa, 0xfe]);
        assert_eq!(uuid.as_bytes(), &[0xfe, 0xaa]);
        assert!(uuid.is_u16(Uuid::EDDYSTONE));
        assert_eq!(uuid.to_wire(), vec![0xaa, 0xfe]);
        assert_eq!(uuid.to_string(), "fe:aa");
    }

    #[test]
    fn long_uuids_have_no_short_form() {
        let uuid = Uuid::from_wire(&[1, 2, 3, 4]);
        assert_eq!(uuid.as_u16(), None);
        assert_eq!(uuid, Uuid::from_wire(&[1, 2, 3, 4]));
    }
}
