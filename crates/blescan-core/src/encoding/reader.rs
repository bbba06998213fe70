use super::Endian;
use crate::DecodeError;

/// Reads HCI frames front to back.
///
/// `Reader` is `Copy`; decoders that must not consume input on failure work
/// on a copy and write it back once everything succeeded.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    frame: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(frame: &'a [u8]) -> Self {
        Self { frame, at: 0 }
    }

    pub const fn position(&self) -> usize {
        self.at
    }

    pub fn remaining(&self) -> usize {
        self.frame.len().saturating_sub(self.at)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes not yet consumed, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.frame[self.at.min(self.frame.len())..]
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.rest().first().copied().ok_or(DecodeError::UnexpectedEof)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.at += 1;
        Ok(byte)
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        self.read_u8().map(|b| b as i8)
    }

    /// Consumes a packet-type or event-code tag.
    ///
    /// On a mismatch nothing is consumed.
    pub fn expect_tag(&mut self, expected: u8) -> Result<(), DecodeError> {
        let found = self.peek_u8()?;
        if found != expected {
            return Err(DecodeError::HeaderMismatch { expected, found });
        }
        self.at += 1;
        Ok(())
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .rest()
            .get(..len)
            .ok_or(DecodeError::UnexpectedEof)?;
        self.at += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    /// Splits off the next `len` bytes as a reader of their own.
    pub fn sub_reader(&mut self, len: usize) -> Result<Reader<'a>, DecodeError> {
        self.read_exact(len).map(Reader::new)
    }

    /// Consumes everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.rest();
        self.at = self.frame.len();
        rest
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>()?;
        Ok(match endian {
            Endian::Big => u16::from_be_bytes(bytes),
            Endian::Little => u16::from_le_bytes(bytes),
        })
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>()?;
        Ok(match endian {
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::encoding::Endian;
    use crate::DecodeError;

    #[test]
    fn reads_command_complete_parameters() {
        // num packets, opcode (LE Set Scan Enable), status
        let mut r = Reader::new(&[0x01, 0x0c, 0x20, 0x00]);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u16(Endian::Little).unwrap(), 0x200c);
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.read_rest(), &[0x00]);
        assert!(r.is_empty());
    }

    #[test]
    fn big_endian_beacon_values() {
        let mut r = Reader::new(&[0x0b, 0x9f, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(r.read_u16(Endian::Big).unwrap(), 2975);
        assert_eq!(r.read_u32(Endian::Big).unwrap(), 256);
    }

    #[test]
    fn short_reads_do_not_advance() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(r.read_u32(Endian::Big).unwrap_err(), DecodeError::UnexpectedEof);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_array::<3>().unwrap(), [1, 2, 3]);
        assert_eq!(r.read_u8().unwrap_err(), DecodeError::UnexpectedEof);
    }

    #[test]
    fn sub_reader_stops_at_declared_length() {
        // an EIR chunk: length 2, flags type, flags value, then the RSSI byte
        let mut r = Reader::new(&[0x02, 0x01, 0x06, 0xdb]);
        let len = r.read_u8().unwrap() as usize;
        let mut chunk = r.sub_reader(len).unwrap();
        assert_eq!(chunk.read_rest(), &[0x01, 0x06]);
        assert_eq!(r.read_i8().unwrap(), -37);
        assert!(r.sub_reader(1).is_err());
    }

    #[test]
    fn tag_mismatch_leaves_input() {
        let mut r = Reader::new(&[0x04, 0x3e]);
        assert_eq!(
            r.expect_tag(0x01).unwrap_err(),
            DecodeError::HeaderMismatch {
                expected: 0x01,
                found: 0x04
            }
        );
        assert_eq!(r.position(), 0);
        r.expect_tag(0x04).unwrap();
        assert_eq!(r.peek_u8().unwrap(), 0x3e);
    }
}
