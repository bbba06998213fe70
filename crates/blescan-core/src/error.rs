use core::fmt;

/// Why a tree or command could not be turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The output buffer is shorter than the tree's byte length.
    BufferTooSmall,
    /// A field holds a value its wire width cannot carry.
    ValueOutOfRange,
    /// A payload does not have the size its slot requires, such as
    /// advertising data beyond 31 bytes or a mis-sized UUID list item.
    InvalidLength,
    /// A URL cannot be compressed into an Eddystone-URL frame.
    InvalidUrl(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("output buffer too small for encoded frame"),
            Self::ValueOutOfRange => f.write_str("field value does not fit its wire width"),
            Self::InvalidLength => f.write_str("payload size does not fit its slot"),
            Self::InvalidUrl(reason) => write!(f, "cannot encode URL: {reason}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Structural decode failures.
///
/// These mean "this buffer is not what the decoder was asked to read". A frame
/// that decodes fine but is not the format a beacon recognizer looks for is
/// not an error; see [`Recognition`](crate::beacons::Recognition).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame ended inside a fixed-size field.
    UnexpectedEof,
    /// The packet-type tag is not the one this decoder handles.
    HeaderMismatch { expected: u8, found: u8 },
    /// A length does not fit the bytes present: an event body running past
    /// the frame, or a UUID list that is not a whole number of entries.
    InvalidLength,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("frame ended inside a field"),
            Self::HeaderMismatch { expected, found } => {
                write!(f, "expected packet type 0x{expected:02x}, found 0x{found:02x}")
            }
            Self::InvalidLength => f.write_str("length does not match the bytes present"),
        }
    }
}

impl std::error::Error for DecodeError {}
