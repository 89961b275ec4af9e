//! Bounds-checked big-endian field access

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, LoadStage, Result};

/// Read-only view over a loaded file with bounds-checked accessors.
///
/// Every accessor names the loader stage it serves so that out-of-bounds
/// reads on malformed input surface as [`Error::OutOfBounds`] instead of
/// panicking.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying bytes
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize, stage: LoadStage) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[offset..end])
            .ok_or(Error::OutOfBounds {
                stage,
                offset,
                len: self.data.len(),
            })
    }

    /// Borrow everything from `offset` to the end of the buffer.
    pub fn tail(&self, offset: usize, stage: LoadStage) -> Result<&'a [u8]> {
        self.data.get(offset..).ok_or(Error::OutOfBounds {
            stage,
            offset,
            len: self.data.len(),
        })
    }

    /// Read a big-endian `u32` at `offset`.
    pub fn u32_at(&self, offset: usize, stage: LoadStage) -> Result<u32> {
        Ok(BigEndian::read_u32(self.slice(offset, 4, stage)?))
    }

    /// Read a big-endian `i32` at `offset`.
    pub fn i32_at(&self, offset: usize, stage: LoadStage) -> Result<i32> {
        Ok(BigEndian::read_i32(self.slice(offset, 4, stage)?))
    }
}

/// Write a big-endian `u32` at `offset` into a growable buffer.
///
/// - `offset == len` appends the value.
/// - `offset < len` overwrites in place, extending the buffer if the value
///   straddles the current end.
/// - `offset > len` is a no-op and returns `false`.
pub fn write_u32_be(buffer: &mut Vec<u8>, offset: usize, value: u32) -> bool {
    if offset > buffer.len() {
        tracing::debug!(
            "Skipping write of 0x{:x} at 0x{:x}: buffer is only 0x{:x} bytes",
            value,
            offset,
            buffer.len()
        );
        return false;
    }

    let end = offset + 4;
    if end > buffer.len() {
        buffer.resize(end, 0);
    }
    BigEndian::write_u32(&mut buffer[offset..end], value);
    true
}
