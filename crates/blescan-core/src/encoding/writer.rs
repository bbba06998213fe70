use super::Endian;
use crate::EncodeError;

/// Writes an encoded tree into a buffer sized by
/// [`Packet::byte_len`](crate::Packet::byte_len).
#[derive(Debug)]
pub struct Writer<'a> {
    out: &'a mut [u8],
    len: usize,
}

impl<'a> Writer<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, len: 0 }
    }

    /// Bytes written so far.
    pub const fn position(&self) -> usize {
        self.len
    }

    pub fn as_written(&self) -> &[u8] {
        &self.out[..self.len]
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let end = self.len + data.len();
        let slot = self
            .out
            .get_mut(self.len..end)
            .ok_or(EncodeError::BufferTooSmall)?;
        slot.copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.write_all(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), EncodeError> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16, endian: Endian) -> Result<(), EncodeError> {
        match endian {
            Endian::Big => self.write_all(&value.to_be_bytes()),
            Endian::Little => self.write_all(&value.to_le_bytes()),
        }
    }

    pub fn write_u32(&mut self, value: u32, endian: Endian) -> Result<(), EncodeError> {
        match endian {
            Endian::Big => self.write_all(&value.to_be_bytes()),
            Endian::Little => self.write_all(&value.to_le_bytes()),
        }
    }
}
