//! POF0 relocation table
//!
//! The engine patches every pointer field listed in this table after
//! loading a file. Each marker advances a cursor (relative to the base
//! offset) by a number of 4-byte words; the tag in the top two bits selects
//! the marker width:
//!
//! - `01xxxxxx` - 1 byte
//! - `10xxxxxx xxxxxxxx` - 2 bytes
//! - `11xxxxxx ...` - 4 bytes
//!
//! A `.ytx` table is always: one marker for the section table pointer, one
//! per section address, one per entry string offset, and a gap marker that
//! jumps over each section's strings to the next section's first entry.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::{EntrySection, YtxFile};
use crate::error::{Error, Result};
use crate::utils::write_u32_be;

/// "POF0" magic signature
pub const POF0_MAGIC: &[u8; 4] = b"POF0";

/// Magic + length field
const POF0_HEADER_SIZE: usize = 8;

/// Section table pointer at base + 0x04
const SECTION_TABLE_MARKER: u8 = b'A';
/// Next entry string offset, 8 bytes further on
const ENTRY_MARKER: u8 = b'B';
/// Next section address field, 12 bytes further on
const SECTION_MARKER: u8 = b'C';

/// Gap markers below this many words use the 2-byte form
const SHORT_GAP_LIMIT: u64 = 0x7FFE;
const SHORT_GAP_BIAS: u64 = 0x8002;
const LONG_GAP_BIAS: u64 = 0xC000_0002;
/// Largest word count the 4-byte form can carry after the bias
const LONG_GAP_MAX_WORDS: u64 = 0x3FFF_FFFF - 2;

/// Generate the POF0 table for the given sections.
///
/// The first entry marker of every section after the first is folded into
/// the preceding gap marker, and no gap marker follows the last section.
///
/// # Errors
///
/// Returns [`Error::GapMarkerOverflow`] if a section's string area is too
/// large for either gap marker encoding.
pub fn build_pof0(sections: &[EntrySection]) -> Result<Vec<u8>> {
    let mut pof0 = Vec::new();
    pof0.extend_from_slice(POF0_MAGIC);
    // Placeholder value for the table size
    pof0.write_u32::<BigEndian>(0)?;

    pof0.push(SECTION_TABLE_MARKER);
    pof0.extend(std::iter::repeat_n(SECTION_MARKER, sections.len()));

    for (index, section) in sections.iter().enumerate() {
        let first = usize::from(index > 0);
        let markers = (section.entry_count() as usize).saturating_sub(first);
        pof0.extend(std::iter::repeat_n(ENTRY_MARKER, markers));

        if index + 1 < sections.len() {
            write_gap_marker(&mut pof0, section)?;
        }
    }

    let size = u32::try_from(pof0.len() - POF0_HEADER_SIZE).map_err(|_| Error::AddressOverflow {
        what: "POF0 size",
    })?;
    write_u32_be(&mut pof0, 4, size);

    Ok(pof0)
}

fn write_gap_marker(pof0: &mut Vec<u8>, section: &EntrySection) -> Result<()> {
    let words = section.string_area_size() as u64 / 4;
    encode_gap_marker(pof0, section.id, words)
}

/// Append the marker that skips `words` words of strings plus the next
/// section's first entry id.
fn encode_gap_marker(pof0: &mut Vec<u8>, section_id: u32, words: u64) -> Result<()> {
    if words < SHORT_GAP_LIMIT {
        pof0.write_u16::<BigEndian>((words + SHORT_GAP_BIAS) as u16)?;
    } else if words <= LONG_GAP_MAX_WORDS {
        pof0.write_u32::<BigEndian>((words + LONG_GAP_BIAS) as u32)?;
    } else {
        tracing::error!(
            "Section 0x{:x} string area of {} words does not fit a POF0 gap marker",
            section_id,
            words
        );
        return Err(Error::GapMarkerOverflow {
            section: section_id,
            words,
        });
    }

    Ok(())
}

/// Decode a POF0 table into the pointer field offsets it lists.
///
/// Offsets are relative to the base offset. Decoding stops at the end of
/// the declared table or at the first zero (padding) byte.
///
/// A 2-byte gap over 0x3FFE words or more carries the `11` tag of a 4-byte
/// marker. Without knowing where the table sits, such a marker is read as
/// 4 bytes unless that reading runs past the end of the table. Use
/// [`decode_pof0_within`] or [`YtxFile::relocation_offsets`] to tell the two
/// apart.
///
/// # Errors
///
/// Returns [`Error::InvalidRelocationTable`] if the magic is missing or the
/// table is truncated.
pub fn decode_pof0(data: &[u8]) -> Result<Vec<u32>> {
    decode_markers(data, u64::from(u32::MAX), &[])
}

/// Decode a POF0 table whose pointer fields all lie below `limit`.
///
/// `limit` is normally the relocation address. A `11`-tagged marker whose
/// 4-byte reading would move past it is read as a 2-byte gap.
///
/// # Errors
///
/// Returns [`Error::InvalidRelocationTable`] if the magic is missing, the
/// table is truncated, or a marker points at or past `limit`.
pub fn decode_pof0_within(data: &[u8], limit: u32) -> Result<Vec<u32>> {
    decode_markers(data, u64::from(limit), &[])
}

impl YtxFile {
    /// Decode this file's POF0 table.
    ///
    /// The section layout settles `11`-tagged markers that could be either
    /// a 2-byte or a 4-byte gap: the reading that lands on the next
    /// section's first string offset field wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRelocationTable`] if the table cannot be
    /// decoded.
    pub fn relocation_offsets(&self) -> Result<Vec<u32>> {
        let limit = u64::try_from(self.relocation_address).unwrap_or(0);
        let gap_targets: Vec<u64> = self
            .sections()
            .iter()
            .skip(1)
            .filter_map(|s| u64::try_from(s.base_address).ok())
            .map(|address| address + 4)
            .collect();
        decode_markers(&self.relocation_table, limit, &gap_targets)
    }
}

fn decode_markers(data: &[u8], limit: u64, gap_targets: &[u64]) -> Result<Vec<u32>> {
    if data.len() < POF0_HEADER_SIZE || &data[..4] != POF0_MAGIC {
        return Err(Error::InvalidRelocationTable("missing POF0 magic".to_string()));
    }

    let size = BigEndian::read_u32(&data[4..8]) as usize;
    let end = POF0_HEADER_SIZE
        .checked_add(size)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::InvalidRelocationTable(format!(
                "declared size 0x{size:x} exceeds the 0x{:x} bytes available",
                data.len() - POF0_HEADER_SIZE
            ))
        })?;

    let mut offsets = Vec::new();
    let mut cursor: u64 = 0;
    let mut pos = POF0_HEADER_SIZE;

    while pos < end {
        let (words, width) = match data[pos] >> 6 {
            0 => break,
            1 => (u64::from(data[pos] & 0x3F), 1),
            2 => (short_reading(data, pos, end).ok_or_else(|| truncated(pos))?, 2),
            _ => read_wide_marker(data, pos, end, cursor, limit, gap_targets)?,
        };

        cursor += words * 4;
        let offset = u32::try_from(cursor).map_err(|_| {
            Error::InvalidRelocationTable(format!("pointer offset 0x{cursor:x} out of range"))
        })?;
        offsets.push(offset);
        pos += width;
    }

    Ok(offsets)
}

/// Word count of a 2-byte marker; the bias sits in bit 15 only.
fn short_reading(data: &[u8], pos: usize, end: usize) -> Option<u64> {
    data.get(pos..pos + 2)
        .filter(|_| pos + 2 <= end)
        .map(|bytes| u64::from(BigEndian::read_u16(bytes) & 0x7FFF))
}

fn long_reading(data: &[u8], pos: usize, end: usize) -> Option<u64> {
    data.get(pos..pos + 4)
        .filter(|_| pos + 4 <= end)
        .map(|bytes| u64::from(BigEndian::read_u32(bytes) & 0x3FFF_FFFF))
}

/// Resolve a `11`-tagged marker into `(words, width)`.
fn read_wide_marker(
    data: &[u8],
    pos: usize,
    end: usize,
    cursor: u64,
    limit: u64,
    gap_targets: &[u64],
) -> Result<(u64, usize)> {
    let lands_at = |words: u64| cursor + words * 4;
    let fits = |words: u64| lands_at(words) < limit;
    let hits = |words: u64| gap_targets.contains(&lands_at(words));

    match (long_reading(data, pos, end), short_reading(data, pos, end)) {
        (Some(long), Some(short)) if hits(short) && !hits(long) => Ok((short, 2)),
        (Some(long), _) if fits(long) => Ok((long, 4)),
        (_, Some(short)) if fits(short) => Ok((short, 2)),
        (None, None) => Err(truncated(pos)),
        _ => Err(Error::InvalidRelocationTable(format!(
            "marker at 0x{pos:x} points past 0x{limit:x}"
        ))),
    }
}

fn truncated(pos: usize) -> Error {
    Error::InvalidRelocationTable(format!("marker at 0x{pos:x} is truncated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ytx::Entry;

    fn section(id: u32, texts: &[&str]) -> EntrySection {
        let mut section = EntrySection::new(id);
        for (index, text) in texts.iter().enumerate() {
            section.push_entry(Entry::new(index as u32, *text)).unwrap();
        }
        section
    }

    #[test]
    fn test_single_section_layout() {
        let pof0 = build_pof0(&[section(1, &["a", "b", "c"])]).unwrap();
        assert_eq!(&pof0[..4], b"POF0");
        assert_eq!(&pof0[4..8], &[0, 0, 0, 5]);
        assert_eq!(&pof0[8..], b"ACBBB");
    }

    #[test]
    fn test_gap_marker_and_skipped_first_entry() {
        // Section 1 strings: "ab" (8) + "c" (4) = 12 bytes = 3 words
        let sections = [section(1, &["ab", "c"]), section(2, &["x", "y"])];
        let pof0 = build_pof0(&sections).unwrap();

        let mut expected = b"ACCBB".to_vec();
        expected.extend_from_slice(&(3u16 + 0x8002).to_be_bytes());
        // Only one marker for the second section's two entries
        expected.push(b'B');

        assert_eq!(&pof0[8..], expected.as_slice());
        assert_eq!(BigEndian::read_u32(&pof0[4..8]) as usize, expected.len());
    }

    #[test]
    fn test_no_gap_after_last_section() {
        let pof0 = build_pof0(&[section(1, &["a"]), section(2, &["b"])]).unwrap();
        // A C C B <gap:2 bytes>, second section's only entry is folded into the gap
        assert_eq!(pof0.len(), 8 + 4 + 2);
    }

    #[test]
    fn test_long_gap_marker() {
        // 0x7FFE words of strings: each 2-char string is 8 bytes = 2 words
        let texts: Vec<String> = (0..0x3FFF).map(|_| "ab".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let sections = [section(1, &refs), section(2, &["z"])];
        assert_eq!(sections[0].string_area_size() / 4, 0x7FFE);

        let pof0 = build_pof0(&sections).unwrap();
        let gap_start = 8 + 1 + 2 + 0x3FFF;
        assert_eq!(
            BigEndian::read_u32(&pof0[gap_start..gap_start + 4]),
            0x7FFE + 0xC000_0002
        );
        assert_eq!(pof0.len(), gap_start + 4);
    }

    #[test]
    fn test_decode_lists_pointer_fields() {
        let sections = [section(1, &["ab", "c"]), section(2, &["x", "y"])];
        let pof0 = build_pof0(&sections).unwrap();
        let offsets = decode_pof0(&pof0).unwrap();

        // Section table pointer, two section address fields, then the
        // string offset fields of all four entries
        let table_end = 8 + 2 * 12;
        let second_table = table_end + 2 * 8 + 12;
        assert_eq!(
            offsets,
            vec![
                4,
                8 + 8,
                8 + 12 + 8,
                table_end + 4,
                table_end + 12,
                second_table + 4,
                second_table + 12,
            ]
        );
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_pof0(b"POF").is_err());
        assert!(decode_pof0(b"JUNK\0\0\0\0").is_err());
        assert!(decode_pof0(b"POF0\0\0\0\x10AB").is_err());
        // 2-byte marker cut off by the declared size
        assert!(decode_pof0(b"POF0\0\0\0\x01\x80\x02").is_err());
        // Padding ends decoding early
        assert_eq!(decode_pof0(b"POF0\0\0\0\x04AC\0\0").unwrap(), vec![4, 16]);
    }

    #[test]
    fn test_gap_marker_encoding_boundaries() {
        let encode = |words: u64| {
            let mut out = Vec::new();
            encode_gap_marker(&mut out, 0x9, words).map(|()| out)
        };

        assert_eq!(encode(0x7FFD).unwrap(), vec![0xFF, 0xFF]);
        assert_eq!(
            encode(0x7FFE).unwrap(),
            (0x7FFEu32 + 0xC000_0002).to_be_bytes().to_vec()
        );
        assert_eq!(encode(0x3FFF_FFFD).unwrap(), vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            encode(0x3FFF_FFFE),
            Err(Error::GapMarkerOverflow {
                section: 0x9,
                words: 0x3FFF_FFFE
            })
        ));
    }

    #[test]
    fn test_decode_mid_size_short_gap() {
        // 0x4000 words of strings: the 2-byte gap marker is 0xC002
        let texts: Vec<String> = (0..0x2000).map(|_| "ab".to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let sections = [section(1, &refs), section(2, &["x", "y", "z"])];
        assert_eq!(sections[0].string_area_size() / 4, 0x4000);

        let pof0 = build_pof0(&sections).unwrap();
        let gap_start = 8 + 1 + 2 + 0x2000;
        assert_eq!(&pof0[gap_start..gap_start + 2], &[0xC0, 0x02]);

        let table_end: u32 = 8 + 2 * 12;
        let second = table_end + sections[0].block_size() as u32;
        let limit = second + sections[1].block_size() as u32;

        let mut expected = vec![4, 8 + 8, 8 + 12 + 8];
        expected.extend((0..0x2000).map(|i| table_end + 4 + i * 8));
        expected.extend([second + 4, second + 12, second + 20]);

        assert_eq!(decode_pof0_within(&pof0, limit).unwrap(), expected);
        // Reading the marker as 4 bytes would run past the table
        assert!(decode_pof0_within(&pof0, second).is_err());
    }
}
