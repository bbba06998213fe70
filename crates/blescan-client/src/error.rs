use blescan_datalink::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("encode error: {0}")]
    Encode(#[from] blescan_core::EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] blescan_core::DecodeError),
    #[error("timed out waiting for an event")]
    Timeout,
    #[error("command 0x{opcode:04x} failed with status 0x{status:02x}")]
    CommandFailed { opcode: u16, status: u8 },
}
