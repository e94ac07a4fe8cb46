use crate::error::{Error, Result};

/// Something that knows its serialized size and can write itself into a
/// bounded data field.
pub trait Payload {
    /// Number of bytes [`Payload::write_to`] produces.
    fn size(&self) -> usize;

    /// Serialize into `dst`, which is exactly [`Payload::size`] bytes long.
    fn write_to(&self, dst: &mut [u8]);

    /// Append to `field`.
    ///
    /// # Errors
    /// [`Error::CapacityExceeded`] if the field has less than `size()` bytes
    /// available, in which case the field is unchanged.
    fn add_to(&self, field: &mut DataField<'_>) -> Result<()> {
        let dst = field.grow(self.size())?;
        self.write_to(dst);
        Ok(())
    }
}

impl Payload for [u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn write_to(&self, dst: &mut [u8]) {
        dst.copy_from_slice(self);
    }
}

impl<const N: usize> Payload for [u8; N] {
    fn size(&self) -> usize {
        N
    }

    fn write_to(&self, dst: &mut [u8]) {
        dst.copy_from_slice(self);
    }
}

impl Payload for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }

    fn write_to(&self, dst: &mut [u8]) {
        dst.copy_from_slice(self);
    }
}

impl<P: Payload + ?Sized> Payload for &P {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn write_to(&self, dst: &mut [u8]) {
        (**self).write_to(dst);
    }
}

/// Append-only, fixed-capacity view over caller-owned storage.
///
/// This is the data field of a transfer frame or PDU under construction; the
/// bytes past `len()` are not part of the field until they are grown into.
#[derive(Debug)]
pub struct DataField<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> DataField<'a> {
    /// Empty field whose capacity is the length of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.buf.len() - self.len
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Extend the field by `n` bytes and return them for writing.
    ///
    /// # Errors
    /// [`Error::CapacityExceeded`] if fewer than `n` bytes are available.
    pub fn grow(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.available() {
            return Err(Error::CapacityExceeded {
                needed: n,
                available: self.available(),
            });
        }
        let start = self.len;
        self.len += n;
        Ok(&mut self.buf[start..self.len])
    }

    /// # Errors
    /// [`Error::CapacityExceeded`] if `data` does not fit.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        self.grow(data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Fill all remaining capacity with `byte`.
    pub fn fill_remaining(&mut self, byte: u8) {
        self.buf[self.len..].fill(byte);
        self.len = self.buf.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_and_extend() {
        let mut storage = [0u8; 8];
        let mut field = DataField::new(&mut storage);
        assert!(field.is_empty());
        assert_eq!(field.capacity(), 8);

        field.extend_from_slice(&[1, 2, 3]).unwrap();
        field.grow(2).unwrap().copy_from_slice(&[4, 5]);

        assert_eq!(field.len(), 5);
        assert_eq!(field.available(), 3);
        assert_eq!(field.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn overflow_leaves_field_unchanged() {
        let mut storage = [0u8; 4];
        let mut field = DataField::new(&mut storage);
        field.extend_from_slice(&[9, 9]).unwrap();

        let err = field.extend_from_slice(&[1, 2, 3]).unwrap_err();

        assert_eq!(
            err,
            Error::CapacityExceeded {
                needed: 3,
                available: 2
            }
        );
        assert_eq!(field.as_slice(), &[9, 9]);
    }

    #[test]
    fn payload_exactly_filling_field() {
        let mut storage = [0u8; 4];
        let mut field = DataField::new(&mut storage);
        [0xAAu8, 0xBB, 0xCC, 0xDD].add_to(&mut field).unwrap();
        assert_eq!(field.available(), 0);
        assert!(vec![1u8].add_to(&mut field).is_err());
    }

    #[test]
    fn fill_remaining_pads_to_capacity() {
        let mut storage = [0u8; 5];
        let mut field = DataField::new(&mut storage);
        field.extend_from_slice(&[1, 2]).unwrap();
        field.fill_remaining(0x55);
        assert_eq!(field.as_slice(), &[1, 2, 0x55, 0x55, 0x55]);

        field.clear();
        assert!(field.is_empty());
        assert_eq!(field.available(), 5);
    }
}
