use crate::error::{FrameError, Result};

/// Bounds-checked cursor over a binary frame.
///
/// Every read either returns the requested bytes or fails with
/// [`FrameError::Truncated`]; the cursor never advances past the end.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(FrameError::Truncated {
                needed: len,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Require that every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(FrameError::Trailing { remaining }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_order() {
        let wire = [0x12, 0x00, 0x05, 0xAA, 0xBB, 0xCC];
        let mut reader = ByteReader::new(&wire);

        assert_eq!(reader.read_u8().unwrap(), 0x12);
        assert_eq!(reader.read_u16_be().unwrap(), 5);
        assert_eq!(reader.read_bytes(2).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn short_read_does_not_advance() {
        let wire = [0x01, 0x02];
        let mut reader = ByteReader::new(&wire);
        reader.read_u8().unwrap();

        let err = reader.read_u64_be().unwrap_err();
        assert_eq!(
            err,
            FrameError::Truncated {
                needed: 8,
                remaining: 1
            }
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.peek_u8(), Some(0x02));
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let wire = [0x00, 0x01, 0x02];
        let mut reader = ByteReader::new(&wire);
        reader.skip(1).unwrap();

        assert_eq!(
            reader.finish().unwrap_err(),
            FrameError::Trailing { remaining: 2 }
        );
        reader.skip(2).unwrap();
        assert!(reader.finish().is_ok());
        assert!(reader.is_empty());
    }

    #[test]
    fn read_u64_is_big_endian() {
        let wire = [0, 0, 0, 0, 0, 0, 0x01, 0x02];
        let mut reader = ByteReader::new(&wire);
        assert_eq!(reader.read_u64_be().unwrap(), 0x0102);
    }
}
