//! Field-by-field big-endian (de)serialization of bit-packed headers.
//!
//! Fields are written most significant bit first in declaration order, so a
//! header codec reads like the layout table of the standard it implements.
//! Callers validate buffer lengths before constructing a writer or reader.
use crate::UInt;

pub(crate) struct BitWriter<'a> {
    buf: &'a mut [u8],
    bit: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, bit: 0 }
    }

    fn put_bits(&mut self, width: u32, value: u64) -> &mut Self {
        for i in (0..width).rev() {
            let byte = &mut self.buf[self.bit / 8];
            let mask = 0x80 >> (self.bit % 8);
            if (value >> i) & 1 == 1 {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
            self.bit += 1;
        }
        self
    }

    pub fn put<const N: u32>(&mut self, value: UInt<N>) -> &mut Self {
        self.put_bits(N, value.value())
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.put_bits(8, u64::from(value))
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.put_bits(16, u64::from(value))
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.put_bits(32, u64::from(value))
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for b in bytes {
            self.put_u8(*b);
        }
        self
    }
}

pub(crate) struct BitReader<'a> {
    buf: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, bit: 0 }
    }

    fn get_bits(&mut self, width: u32) -> u64 {
        let mut value = 0u64;
        for _ in 0..width {
            let bit = (self.buf[self.bit / 8] >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | u64::from(bit);
            self.bit += 1;
        }
        value
    }

    pub fn get<const N: u32>(&mut self) -> UInt<N> {
        UInt::new(self.get_bits(N))
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn get_u8(&mut self) -> u8 {
        self.get_bits(8) as u8
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn get_u16(&mut self) -> u16 {
        self.get_bits(16) as u16
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn get_u32(&mut self) -> u32 {
        self.get_bits(32) as u32
    }

    /// Byte offset of the next unread whole byte.
    pub fn position(&self) -> usize {
        self.bit.div_ceil(8)
    }

    /// Everything after the current (byte aligned) position.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.position()..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_fields_msb_first() {
        let mut buf = [0u8; 2];
        BitWriter::new(&mut buf)
            .put(UInt::<3>::new(0b101))
            .put(UInt::<1>::new(1))
            .put(UInt::<4>::new(0b0011))
            .put(UInt::<8>::new(0xC4));
        assert_eq!(buf, [0b1011_0011, 0xC4]);
    }

    #[test]
    fn overwrites_existing_bits() {
        let mut buf = [0xFFu8; 1];
        BitWriter::new(&mut buf).put(UInt::<2>::new(0)).put(UInt::<6>::new(0b10_1010));
        assert_eq!(buf, [0b0010_1010]);
    }

    #[test]
    fn reads_back_fields() {
        let buf = [0x21, 0x23, 0xAB, 0xCD];
        let mut reader = BitReader::new(&buf);
        assert_eq!(reader.get::<2>().value(), 0);
        assert_eq!(reader.get::<1>().value(), 1);
        assert_eq!(reader.get::<1>().value(), 0);
        assert_eq!(reader.get::<2>().value(), 0);
        assert_eq!(reader.get::<10>().value(), 0x123);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.get_u16(), 0xABCD);
        assert!(reader.rest().is_empty());
    }

    #[test]
    fn multi_byte_integers_are_big_endian() {
        let mut buf = [0u8; 7];
        BitWriter::new(&mut buf)
            .put_u32(0x1234_5678)
            .put_u16(0x9ABC)
            .put_u8(0xDE);
        assert_eq!(buf, [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE]);

        let mut reader = BitReader::new(&buf);
        assert_eq!(reader.get_u32(), 0x1234_5678);
        assert_eq!(reader.rest(), &[0x9A, 0xBC, 0xDE]);
    }
}
