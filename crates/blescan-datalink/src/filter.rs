use blescan_core::hci::{EVENT_COMMAND_COMPLETE, EVENT_LE_META, HCI_EVENT};

/// Kernel-side filter for a raw HCI socket.
///
/// Mirrors the 14-byte `struct hci_filter` passed to `setsockopt(SOL_HCI,
/// HCI_FILTER, ..)`: a packet-type mask, a 64-bit event mask split into two
/// little-endian words, and an opcode (zero for any).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HciFilter {
    pub type_mask: u32,
    pub event_mask: [u32; 2],
    pub opcode: u16,
}

impl HciFilter {
    pub const LEN: usize = 14;

    /// Accepts command-complete and LE-meta events, which is all a scanner
    /// needs to see.
    pub fn scanning() -> Self {
        Self::default()
            .allow_packet_type(HCI_EVENT)
            .allow_event(EVENT_COMMAND_COMPLETE)
            .allow_event(EVENT_LE_META)
    }

    pub fn allow_packet_type(mut self, packet_type: u8) -> Self {
        self.type_mask |= 1 << (packet_type & 0x1f);
        self
    }

    pub fn allow_event(mut self, code: u8) -> Self {
        let code = code & 0x3f;
        self.event_mask[usize::from(code >> 5)] |= 1 << (code & 0x1f);
        self
    }

    pub fn allows_event(&self, code: u8) -> bool {
        if code > 0x3f {
            return false;
        }
        self.event_mask[usize::from(code >> 5)] & (1 << (code & 0x1f)) != 0
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&self.type_mask.to_le_bytes());
        out[4..8].copy_from_slice(&self.event_mask[0].to_le_bytes());
        out[8..12].copy_from_slice(&self.event_mask[1].to_le_bytes());
        out[12..14].copy_from_slice(&self.opcode.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Self {
            type_mask: word(0),
            event_mask: [word(4), word(8)],
            opcode: u16::from_le_bytes([bytes[12], bytes[13]]),
        }
    }
}
