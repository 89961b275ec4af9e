//! UTF-16BE string encoding used by `.ytx` string blobs
//!
//! Every blob on disk is a sequence of big-endian UTF-16 code units, a NUL
//! code unit, and one extra NUL code unit when needed to reach a 4-byte
//! boundary.

use std::string::FromUtf16Error;

use crate::error::{Error, LoadStage, Result};

/// Alignment of every string blob in bytes
pub const STRING_ALIGNMENT: usize = 4;

/// Encode UTF-8 text as UTF-16 code units (surrogate pairs preserved).
pub fn utf8_to_utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Decode UTF-16 code units into UTF-8 text.
pub fn utf16_to_utf8(units: &[u16]) -> std::result::Result<String, FromUtf16Error> {
    String::from_utf16(units)
}

/// Read NUL-terminated UTF-16BE code units starting at `offset`.
pub fn read_utf16_be(data: &[u8], offset: usize) -> Result<Vec<u16>> {
    if offset >= data.len() {
        return Err(Error::OutOfBounds {
            stage: LoadStage::Strings,
            offset,
            len: data.len(),
        });
    }

    let mut units = Vec::new();
    for pair in data[offset..].chunks_exact(2) {
        let unit = u16::from_be_bytes([pair[0], pair[1]]);
        if unit == 0 {
            return Ok(units);
        }
        units.push(unit);
    }

    Err(Error::UnterminatedString { offset })
}

/// Size in bytes that `text` occupies on disk, terminator and padding included.
pub fn encoded_size(text: &str) -> usize {
    let raw = text.encode_utf16().count() * 2 + 2;
    raw.next_multiple_of(STRING_ALIGNMENT)
}

/// Encode `text` as a NUL-terminated, 4-byte aligned UTF-16BE blob.
pub fn encode_utf16_be(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_size(text));
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }

    // Null terminator
    bytes.extend_from_slice(&[0, 0]);

    if bytes.len() % STRING_ALIGNMENT != 0 {
        bytes.extend_from_slice(&[0, 0]);
    }

    bytes
}
