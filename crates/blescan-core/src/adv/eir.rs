/// Extended Inquiry Response data types that the advertising-report decoder
/// dispatches on.
///
/// Types without a dedicated decoder are carried as [`Other`](Self::Other)
/// and keep their payload opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EirType {
    Flags,
    IncompleteUuids16,
    CompleteUuids16,
    IncompleteUuids32,
    CompleteUuids32,
    IncompleteUuids128,
    CompleteUuids128,
    ShortName,
    CompleteName,
    Solicitation16,
    Solicitation32,
    Solicitation128,
    ServiceData16,
    ServiceData32,
    ServiceData128,
    ManufacturerData,
    Other(u8),
}

impl EirType {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::Flags,
            0x02 => Self::IncompleteUuids16,
            0x03 => Self::CompleteUuids16,
            0x04 => Self::IncompleteUuids32,
            0x05 => Self::CompleteUuids32,
            0x06 => Self::IncompleteUuids128,
            0x07 => Self::CompleteUuids128,
            0x08 => Self::ShortName,
            0x09 => Self::CompleteName,
            0x14 => Self::Solicitation16,
            0x1F => Self::Solicitation32,
            0x15 => Self::Solicitation128,
            0x16 => Self::ServiceData16,
            0x20 => Self::ServiceData32,
            0x21 => Self::ServiceData128,
            0xFF => Self::ManufacturerData,
            v => Self::Other(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Flags => 0x01,
            Self::IncompleteUuids16 => 0x02,
            Self::CompleteUuids16 => 0x03,
            Self::IncompleteUuids32 => 0x04,
            Self::CompleteUuids32 => 0x05,
            Self::IncompleteUuids128 => 0x06,
            Self::CompleteUuids128 => 0x07,
            Self::ShortName => 0x08,
            Self::CompleteName => 0x09,
            Self::Solicitation16 => 0x14,
            Self::Solicitation32 => 0x1F,
            Self::Solicitation128 => 0x15,
            Self::ServiceData16 => 0x16,
            Self::ServiceData32 => 0x20,
            Self::ServiceData128 => 0x21,
            Self::ManufacturerData => 0xFF,
            Self::Other(v) => v,
        }
    }

    /// Width in bytes of the UUIDs this type carries, if it carries any.
    pub const fn uuid_width(self) -> Option<usize> {
        match self {
            Self::IncompleteUuids16
            | Self::CompleteUuids16
            | Self::Solicitation16
            | Self::ServiceData16 => Some(2),
            Self::IncompleteUuids32
            | Self::CompleteUuids32
            | Self::Solicitation32
            | Self::ServiceData32 => Some(4),
            Self::IncompleteUuids128
            | Self::CompleteUuids128
            | Self::Solicitation128
            | Self::ServiceData128 => Some(16),
            _ => None,
        }
    }

    /// Assigned-numbers label, or `None` for codes missing from [`EIR_TYPE_LABELS`].
    pub fn label(self) -> Option<&'static str> {
        crate::field::lookup_label(EIR_TYPE_LABELS, self.to_u8())
    }
}

/// Labels for the `"type"` byte of every EIR chunk.
pub const EIR_TYPE_LABELS: &[(u8, &str)] = &[
    (0x01, "flags"),
    (0x02, "incomplete_list_16_bit_svc_uuids"),
    (0x03, "complete_list_16_bit_svc_uuids"),
    (0x04, "incomplete_list_32_bit_svc_uuids"),
    (0x05, "complete_list_32_bit_svc_uuids"),
    (0x06, "incomplete_list_128_bit_svc_uuids"),
    (0x07, "complete_list_128_bit_svc_uuids"),
    (0x08, "shortened_local_name"),
    (0x09, "complete_local_name"),
    (0x0A, "tx_power_level"),
    (0x0D, "class_of_device"),
    (0x0E, "simple_pairing_hash"),
    (0x0F, "simple_pairing_rand"),
    (0x10, "sec_mgr_tk"),
    (0x11, "sec_mgr_oob_flags"),
    (0x12, "slave_conn_intvl_range"),
    (0x14, "list_16_bit_svc_sollication_uuids"),
    (0x15, "list_128_bit_svc_sollication_uuids"),
    (0x16, "svc_data_16_bit_uuid"),
    (0x17, "pub_target_addr"),
    (0x18, "rand_target_addr"),
    (0x19, "appearance"),
    (0x1A, "adv_intvl"),
    (0x1B, "le_addr"),
    (0x1C, "le_role"),
    (0x1F, "list_32_bit_svc_sollication_uuids"),
    (0x20, "svc_data_32_bit_uuid"),
    (0x21, "svc_data_128_bit_uuid"),
    (0x22, "sec_conn_confirm"),
    (0x23, "sec_conn_rand"),
    (0x24, "uri"),
    (0xFF, "mfg_specific_data"),
];

/// MSB-first labels of the advertising flags byte.
pub const FLAG_LABELS: &[&str; 8] = &[
    "Undef",
    "Undef",
    "Undef",
    "Simul LE - BR/EDR (Host)",
    "Simul LE - BR/EDR (Control.)",
    "BR/EDR Not Supported",
    "LE General Disc.",
    "LE Limited Disc.",
];
