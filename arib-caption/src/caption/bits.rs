//! Bounds-checked big-endian bit reader.

use crate::error::{Error, Result};

/// Reads MSB-first bit fields out of a byte slice. Every read is checked
/// against the end of the slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Bytes not yet consumed (a partially read byte counts as consumed).
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub((self.bit_pos + 7) / 8)
    }

    /// Current byte offset, rounded up.
    pub fn position(&self) -> usize {
        (self.bit_pos + 7) / 8
    }

    /// Read up to 32 bits.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= 32);
        let end = self.bit_pos + count as usize;
        if end > self.data.len() * 8 {
            return Err(Error::truncated((end + 7) / 8, self.data.len()));
        }
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
            value = (value << 1) | bit as u32;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        self.read_bits(24)
    }

    pub fn skip_bits(&mut self, count: usize) -> Result<()> {
        let end = self.bit_pos + count;
        if end > self.data.len() * 8 {
            return Err(Error::truncated((end + 7) / 8, self.data.len()));
        }
        self.bit_pos = end;
        Ok(())
    }

    pub fn skip_bytes(&mut self, count: usize) -> Result<()> {
        self.skip_bits(count * 8)
    }

    /// Take `count` whole bytes, starting at the next byte boundary.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let start = self.position();
        let end = start + count;
        if end > self.data.len() {
            return Err(Error::truncated(end, self.data.len()));
        }
        self.bit_pos = end * 8;
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fields() {
        let data = [0b1011_0011, 0x12, 0x34, 0x56, 0x78];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(2).unwrap(), 0b10);
        assert_eq!(r.read_bits(6).unwrap(), 0b11_0011);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.remaining_bytes(), 2);
        assert_eq!(r.read_bytes(2).unwrap(), &[0x56, 0x78]);
        assert_eq!(r.remaining_bytes(), 0);
    }

    #[test]
    fn test_read_u24() {
        let data = [0x01, 0x02, 0x03];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_u24().unwrap(), 0x010203);
    }

    #[test]
    fn test_overrun_is_error() {
        let data = [0xFF, 0xFF];
        let mut r = BitReader::new(&data);
        assert!(r.read_bits(12).is_ok());
        assert!(matches!(r.read_u8(), Err(Error::Truncated { .. })));
        assert!(r.read_bytes(2).is_err());
        assert!(r.skip_bits(5).is_err());
    }

    #[test]
    fn test_read_bytes_after_partial_byte_aligns() {
        let data = [0xF0, 0xAA, 0xBB];
        let mut r = BitReader::new(&data);
        r.read_bits(4).unwrap();
        assert_eq!(r.read_bytes(1).unwrap(), &[0xAA]);
        assert_eq!(r.position(), 2);
    }
}
