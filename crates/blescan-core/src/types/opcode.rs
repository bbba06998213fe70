/// A packed HCI command opcode combining a 6-bit opcode group field (OGF) and
/// a 10-bit opcode command field (OCF) into a single `u16`.
///
/// The upper 6 bits encode the group and the lower 10 bits the command,
/// matching the wire format where the packed value travels little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Opcode(u16);

impl Opcode {
    /// OGF of the LE controller command group.
    pub const OGF_LE_CONTROLLER: u8 = 0x08;

    /// Creates an `Opcode` from a group and command number.
    pub const fn new(ogf: u8, ocf: u16) -> Self {
        Self((((ogf as u16) & 0x3F) << 10) | (ocf & 0x03FF))
    }

    /// Returns the raw packed `u16` representation.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Constructs an `Opcode` from a pre-packed `u16`.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Extracts the opcode group field from the upper 6 bits.
    pub const fn ogf(self) -> u8 {
        (self.0 >> 10) as u8
    }

    /// Extracts the 10-bit opcode command field.
    pub const fn ocf(self) -> u16 {
        self.0 & 0x03FF
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn packs_le_scan_enable() {
        let op = Opcode::new(Opcode::OGF_LE_CONTROLLER, 0x000C);
        assert_eq!(op.raw(), 0x200C);
        assert_eq!(op.to_le_bytes(), [0x0C, 0x20]);
        assert_eq!(op.ogf(), 0x08);
        assert_eq!(op.ocf(), 0x000C);
    }

    #[test]
    fn masks_oversized_parts() {
        let op = Opcode::new(0xFF, 0xFFFF);
        assert_eq!(op.ogf(), 0x3F);
        assert_eq!(op.ocf(), 0x03FF);
    }
}
