//! `.ytx` file reading and parsing
//!
//! Loading runs in fixed stages: header values, POF0 bytes, section table,
//! then each section's entries and strings. The first failing stage aborts
//! the load.

use std::path::Path;

use super::{
    BASE_OFFSET, ENTRY_RECORD_SIZE, Entry, EntrySection, HEADER_SIZE, RELOCATION_ADDRESS_OFFSET,
    SECTION_COUNT_OFFSET, SECTION_RECORD_SIZE, SECTION_TABLE_OFFSET, YtxFile,
};
use crate::error::{Error, LoadStage, Result};
use crate::utils::{ByteView, read_utf16_be, utf16_to_utf8};

/// Values read from the fixed header
#[derive(Debug, Clone, Copy)]
struct HeaderValues {
    section_count: u32,
    relocation_address: i32,
}

/// One 12-byte record of the section table
#[derive(Debug, Clone, Copy)]
struct SectionRecord {
    id: u32,
    entry_count: u32,
    base_address: i32,
}

/// Read a .ytx file from disk
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read, or any
/// structural error from [`parse_ytx_bytes`].
pub fn read_ytx<P: AsRef<Path>>(path: P) -> Result<YtxFile> {
    let data = std::fs::read(path)?;
    parse_ytx_bytes(&data)
}

/// Parse .ytx data from bytes
///
/// # Errors
///
/// - [`Error::MalformedHeader`] if the buffer is shorter than the header.
/// - [`Error::InvalidRelocationAddress`] if the POF0 address is non-positive
///   or past the end of the buffer.
/// - [`Error::OutOfBounds`] / [`Error::UnterminatedString`] if a section,
///   entry, or string lies outside the buffer.
pub fn parse_ytx_bytes(data: &[u8]) -> Result<YtxFile> {
    let view = ByteView::new(data);

    let header = read_header(view)?;
    let relocation_table = read_relocation_table(view, header.relocation_address)?;
    let records = read_section_table(view, header.section_count)?;
    let mut lossy_entries = Vec::new();
    let sections = records
        .iter()
        .map(|record| read_section_entries(view, record, &mut lossy_entries))
        .collect::<Result<Vec<_>>>()?;
    let padding = read_padding(view, &records);

    tracing::debug!(
        "Loaded {} sections with {} entries",
        sections.len(),
        sections.iter().map(EntrySection::len).sum::<usize>()
    );

    Ok(YtxFile::from_parts(
        data[..HEADER_SIZE].to_vec(),
        padding,
        header.relocation_address,
        relocation_table,
        sections,
    )
    .with_lossy_entries(lossy_entries))
}

fn read_header(view: ByteView<'_>) -> Result<HeaderValues> {
    if view.len() < HEADER_SIZE {
        tracing::error!(
            "File is invalid or not compatible: {} bytes is shorter than the header",
            view.len()
        );
        return Err(Error::MalformedHeader { len: view.len() });
    }

    let section_count = view.u32_at(SECTION_COUNT_OFFSET, LoadStage::Header)?;
    let relocation_address = view.i32_at(RELOCATION_ADDRESS_OFFSET, LoadStage::Header)?;
    tracing::debug!(
        "Header loaded: {} entry sections, POF0 at 0x{:x}",
        section_count,
        relocation_address
    );

    Ok(HeaderValues {
        section_count,
        relocation_address,
    })
}

fn read_relocation_table(view: ByteView<'_>, address: i32) -> Result<Vec<u8>> {
    let invalid = || Error::InvalidRelocationAddress {
        address,
        len: view.len(),
    };

    if address <= 0 {
        tracing::error!("Invalid POF0 address: 0x{:x}", address);
        return Err(invalid());
    }

    let start = address as usize + BASE_OFFSET;
    let table = view.tail(start, LoadStage::Relocation).map_err(|_| {
        tracing::error!(
            "File is invalid or not compatible: POF0 address 0x{:x} not reached",
            address
        );
        invalid()
    })?;

    tracing::debug!("POF0 loaded: 0x{:x} bytes", table.len());
    Ok(table.to_vec())
}

fn read_section_table(view: ByteView<'_>, count: u32) -> Result<Vec<SectionRecord>> {
    let count = count as usize;
    let table_len = count
        .checked_mul(SECTION_RECORD_SIZE)
        .ok_or(Error::OutOfBounds {
            stage: LoadStage::SectionTable,
            offset: SECTION_TABLE_OFFSET,
            len: view.len(),
        })?;
    // Check the whole table before allocating for it
    view.slice(SECTION_TABLE_OFFSET, table_len, LoadStage::SectionTable)?;

    let mut records: Vec<SectionRecord> = Vec::with_capacity(count);
    for index in 0..count {
        let offset = SECTION_TABLE_OFFSET + index * SECTION_RECORD_SIZE;
        let id = view.u32_at(offset, LoadStage::SectionTable)?;
        let entry_count = view.u32_at(offset + 4, LoadStage::SectionTable)?;
        let address = view.u32_at(offset + 8, LoadStage::SectionTable)?;
        let base_address = i32::try_from(address).map_err(|_| Error::OutOfBounds {
            stage: LoadStage::SectionTable,
            offset: address as usize,
            len: view.len(),
        })?;

        if records.iter().any(|r| r.id == id) {
            tracing::warn!("Duplicate entry section id 0x{:x}", id);
        }

        tracing::debug!(
            "Entry section loaded: ID = 0x{:x}; Entries = {}; Address = 0x{:x}",
            id,
            entry_count,
            base_address
        );
        records.push(SectionRecord {
            id,
            entry_count,
            base_address,
        });
    }

    Ok(records)
}

/// Read one section's entries and strings.
///
/// Entries whose text had to be decoded lossily are pushed to `lossy` as
/// `(section_id, entry_id)`.
fn read_section_entries(
    view: ByteView<'_>,
    record: &SectionRecord,
    lossy: &mut Vec<(u32, u32)>,
) -> Result<EntrySection> {
    let table_start = record.base_address as usize + BASE_OFFSET;
    let count = record.entry_count as usize;
    let table_len = count
        .checked_mul(ENTRY_RECORD_SIZE)
        .ok_or(Error::OutOfBounds {
            stage: LoadStage::EntryTable,
            offset: table_start,
            len: view.len(),
        })?;
    view.slice(table_start, table_len, LoadStage::EntryTable)?;

    tracing::debug!(
        "Loading entries from 0x{:x}, entry section ID = 0x{:x}",
        table_start,
        record.id
    );

    let mut entries: Vec<Entry> = Vec::with_capacity(count);
    for index in 0..count {
        let offset = table_start + index * ENTRY_RECORD_SIZE;
        let id = view.u32_at(offset, LoadStage::EntryTable)?;
        let string_offset = view.u32_at(offset + 4, LoadStage::EntryTable)?;

        let string_start = (string_offset as usize)
            .checked_add(BASE_OFFSET)
            .ok_or(Error::OutOfBounds {
                stage: LoadStage::Strings,
                offset: string_offset as usize,
                len: view.len(),
            })?;
        let string_address = i32::try_from(string_offset).map_err(|_| Error::OutOfBounds {
            stage: LoadStage::Strings,
            offset: string_start,
            len: view.len(),
        })?;

        let units = read_utf16_be(view.bytes(), string_start)?;
        let text = utf16_to_utf8(&units).unwrap_or_else(|_| {
            tracing::warn!(
                "Entry 0x{:x} in section 0x{:x} holds invalid UTF-16; decoding lossily",
                id,
                record.id
            );
            lossy.push((record.id, id));
            String::from_utf16_lossy(&units)
        });

        if entries.iter().any(|e| e.id == id) {
            tracing::warn!("Duplicate entry id 0x{:x} in section 0x{:x}", id, record.id);
        }

        tracing::debug!(
            "Entry loaded: ID = 0x{:x}, String address = 0x{:x}, String = {}",
            id,
            string_address,
            text
        );
        entries.push(Entry {
            id,
            string_address: Some(string_address),
            text,
        });
    }

    Ok(EntrySection::from_parts(record.id, record.base_address, entries))
}

/// Bytes between the end of the section table and the first entry table.
fn read_padding(view: ByteView<'_>, records: &[SectionRecord]) -> Vec<u8> {
    let table_end = SECTION_TABLE_OFFSET + records.len() * SECTION_RECORD_SIZE;
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let anchor = first.base_address as usize + BASE_OFFSET;
    if anchor <= table_end {
        return Vec::new();
    }

    // The entry table of the first section was already read from `anchor`
    view.slice(table_end, anchor - table_end, LoadStage::SectionTable)
        .map(<[u8]>::to_vec)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ytx::{POF0_MAGIC, SECTION_TABLE_POINTER_OFFSET};

    /// Single section `0x7` with entries `0x1 = "Hi"` and `0x2 = "Yo!"`.
    fn sample_bytes() -> Vec<u8> {
        let mut data = vec![0u8; 0x28];
        data[SECTION_TABLE_POINTER_OFFSET + 3] = 0x08;
        data[SECTION_COUNT_OFFSET + 3] = 1;
        // Section table: id 7, 2 entries, entry table at 0x34 - 0x20 = 0x14
        data.extend_from_slice(&[0, 0, 0, 7, 0, 0, 0, 2, 0, 0, 0, 0x14]);
        // Entry table at 0x34, strings start at 0x44
        data.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0x24]);
        data.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 0x2C]);
        // "Hi" + NUL + pad = 8 bytes
        data.extend_from_slice(&[0, b'H', 0, b'i', 0, 0, 0, 0]);
        // "Yo!" + NUL = 8 bytes
        data.extend_from_slice(&[0, b'Y', 0, b'o', 0, b'!', 0, 0]);
        // POF0 at 0x54
        data[RELOCATION_ADDRESS_OFFSET + 3] = 0x34;
        data.extend_from_slice(POF0_MAGIC);
        data.extend_from_slice(&[0, 0, 0, 4, 0x41, 0x43, 0x42, 0x42]);
        data
    }

    #[test]
    fn test_parse_sample() {
        let file = parse_ytx_bytes(&sample_bytes()).unwrap();
        assert_eq!(file.relocation_address, 0x34);
        assert_eq!(file.relocation_table.len(), 12);
        assert_eq!(file.sections().len(), 1);

        let section = &file.sections()[0];
        assert_eq!(section.id, 7);
        assert_eq!(section.entry_count(), 2);
        assert_eq!(section.base_address, 0x14);
        assert_eq!(section.entries()[0].text, "Hi");
        assert_eq!(section.entries()[0].string_address, Some(0x24));
        assert_eq!(section.entries()[1].text, "Yo!");
        assert_eq!(section.entries()[1].string_address, Some(0x2C));
    }

    #[test]
    fn test_short_buffer_is_malformed_header() {
        let err = parse_ytx_bytes(&[0u8; 0x20]).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { len: 0x20 }));
    }

    #[test]
    fn test_relocation_address_checks() {
        let mut data = sample_bytes();
        data[RELOCATION_ADDRESS_OFFSET..RELOCATION_ADDRESS_OFFSET + 4]
            .copy_from_slice(&0i32.to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::InvalidRelocationAddress { address: 0, .. })
        ));

        data[RELOCATION_ADDRESS_OFFSET..RELOCATION_ADDRESS_OFFSET + 4]
            .copy_from_slice(&(-4i32).to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::InvalidRelocationAddress { address: -4, .. })
        ));

        data[RELOCATION_ADDRESS_OFFSET..RELOCATION_ADDRESS_OFFSET + 4]
            .copy_from_slice(&0x1000i32.to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::InvalidRelocationAddress { address: 0x1000, .. })
        ));
    }

    #[test]
    fn test_truncated_tables_are_out_of_bounds() {
        let mut data = sample_bytes();
        // Claim far more sections than the file holds
        data[SECTION_COUNT_OFFSET..SECTION_COUNT_OFFSET + 4]
            .copy_from_slice(&0x00FF_FFFFu32.to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::OutOfBounds {
                stage: LoadStage::SectionTable,
                ..
            })
        ));

        let mut data = sample_bytes();
        // Entry count of the only section
        data[0x2C..0x30].copy_from_slice(&0x1000u32.to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::OutOfBounds {
                stage: LoadStage::EntryTable,
                ..
            })
        ));

        let mut data = sample_bytes();
        // String offset of the first entry
        data[0x38..0x3C].copy_from_slice(&0x4000u32.to_be_bytes());
        assert!(matches!(
            parse_ytx_bytes(&data),
            Err(Error::OutOfBounds {
                stage: LoadStage::Strings,
                ..
            })
        ));
    }

    #[test]
    fn test_lossy_decoding_of_lone_surrogate() {
        let mut data = sample_bytes();
        // Replace "Hi" with a lone high surrogate
        data[0x44..0x46].copy_from_slice(&[0xD8, 0x00]);
        let file = parse_ytx_bytes(&data).unwrap();
        assert_eq!(file.sections()[0].entries()[0].text, "\u{FFFD}i");
        assert_eq!(file.lossy_entries(), &[(0x7, 0x1)]);

        let clean = parse_ytx_bytes(&sample_bytes()).unwrap();
        assert!(clean.lossy_entries().is_empty());
    }

    #[test]
    fn test_padding_before_first_section_is_kept() {
        let file = parse_ytx_bytes(&sample_bytes()).unwrap();
        assert!(file.padding().is_empty());
        assert_eq!(file.header().len(), HEADER_SIZE);
    }

    #[test]
    fn test_entries_are_logged_at_debug_level() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            parse_ytx_bytes(&sample_bytes()).unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let entry_lines: Vec<&str> = logs.lines().filter(|l| l.contains("Entry loaded")).collect();
        assert_eq!(entry_lines.len(), 2);
        assert!(entry_lines.iter().all(|l| l.contains("DEBUG")));
        assert!(entry_lines[1].contains("String = Yo!"));
    }
}
