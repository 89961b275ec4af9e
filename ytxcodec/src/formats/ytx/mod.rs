//! .ytx localized string table format
//!
//! Big-endian binary format used for in-game text. Layout:
//!
//! | Offset                    | Contents                                          |
//! |---------------------------|---------------------------------------------------|
//! | `0x1C`                    | POF0 address (relative to `0x20`)                 |
//! | `0x20`                    | entry section count                               |
//! | `0x28`                    | section records `{id, entry_count, address}`      |
//! | `section.address + 0x20`  | entry records `{id, string_offset}`, then strings |
//! | `pof0_address + 0x20`     | POF0 relocation table                             |
//!
//! Strings are NUL-terminated UTF-16BE padded to a 4-byte boundary. Most
//! stored addresses are relative to [`BASE_OFFSET`].

mod editor;
mod pof0;
mod reader;
mod writer;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::encoded_size;

pub use pof0::{POF0_MAGIC, build_pof0, decode_pof0, decode_pof0_within};
pub use reader::{parse_ytx_bytes, read_ytx};
pub use writer::{Reassembled, reassemble, serialize_ytx, write_ytx};

/// Fixed header size that most addresses are relative to
pub const BASE_OFFSET: usize = 0x20;

/// Header field holding the POF0 address
pub const RELOCATION_ADDRESS_OFFSET: usize = 0x1C;

/// Header field holding the number of entry sections
pub const SECTION_COUNT_OFFSET: usize = 0x20;

/// Header field holding the section table address (relative to base)
pub const SECTION_TABLE_POINTER_OFFSET: usize = 0x24;

/// Start of the section table; also the size of the header kept verbatim
pub const SECTION_TABLE_OFFSET: usize = 0x28;

/// Size of the header bytes preserved across a save
pub const HEADER_SIZE: usize = SECTION_TABLE_OFFSET;

/// Size of each section record (id + entry count + address)
pub const SECTION_RECORD_SIZE: usize = 12;

/// Size of each entry record (id + string offset)
pub const ENTRY_RECORD_SIZE: usize = 8;

/// A single string entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Identifier, unique within its section
    pub id: u32,
    /// Offset of the string blob relative to [`BASE_OFFSET`].
    ///
    /// `None` for entries added since the last reassembly.
    pub string_address: Option<i32>,
    /// The text content
    pub text: String,
}

impl Entry {
    /// Create an entry whose string address is not yet resolved
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            string_address: None,
            text: text.into(),
        }
    }

    /// Bytes occupied on disk by this entry's string
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        encoded_size(&self.text)
    }
}

/// A group of entries sharing a section id
///
/// Entries are kept in on-disk order. The entry list is only changed through
/// methods that keep the cached count equal to the number of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySection {
    /// Identifier, unique within the file
    pub id: u32,
    entry_count: u32,
    /// Address of the entry table relative to [`BASE_OFFSET`]
    pub base_address: i32,
    entries: Vec<Entry>,
}

impl EntrySection {
    /// Create an empty section
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            entry_count: 0,
            base_address: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn from_parts(id: u32, base_address: i32, entries: Vec<Entry>) -> Self {
        Self {
            id,
            entry_count: entries.len() as u32,
            base_address,
            entries,
        }
    }

    /// Cached entry count written to the section table
    #[must_use]
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in on-disk order
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Look up an entry by id
    #[must_use]
    pub fn entry(&self, id: u32) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Check if an entry with the given id exists
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Total bytes occupied by this section's strings
    #[must_use]
    pub fn string_area_size(&self) -> usize {
        self.entries.iter().map(Entry::encoded_size).sum()
    }

    /// Bytes occupied by the entry table plus strings
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.entries.len() * ENTRY_RECORD_SIZE + self.string_area_size()
    }

    /// Append an entry, rejecting duplicate ids.
    pub fn push_entry(&mut self, entry: Entry) -> Result<()> {
        if self.contains(entry.id) {
            return Err(Error::DuplicateEntryId {
                entry: entry.id,
                section: self.id,
            });
        }
        let count = self
            .entry_count
            .checked_add(1)
            .ok_or(Error::AddressOverflow {
                what: "entry count",
            })?;

        self.entries.push(entry);
        self.entry_count = count;
        debug_assert_eq!(self.entries.len(), self.entry_count as usize);
        Ok(())
    }

    /// Remove an entry by id, preserving the order of the rest.
    pub fn remove_entry(&mut self, id: u32) -> Result<Entry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::EntryNotFound {
                entry: id,
                section: self.id,
            })?;

        let removed = self.entries.remove(pos);
        self.entry_count -= 1;
        debug_assert_eq!(self.entries.len(), self.entry_count as usize);
        Ok(removed)
    }
}

/// A parsed `.ytx` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtxFile {
    /// Header bytes `0x00..0x28`, re-emitted verbatim except for the patched fields
    header: Vec<u8>,
    /// Bytes between the section table and the first entry table
    padding: Vec<u8>,
    /// Address of the POF0 table relative to [`BASE_OFFSET`]
    pub relocation_address: i32,
    /// POF0 bytes as loaded, replaced on every reassembly
    pub relocation_table: Vec<u8>,
    sections: Vec<EntrySection>,
    /// `(section_id, entry_id)` of entries whose text was decoded lossily
    lossy_entries: Vec<(u32, u32)>,
}

impl Default for YtxFile {
    fn default() -> Self {
        let mut header = vec![0u8; HEADER_SIZE];
        let table_pointer = (SECTION_TABLE_OFFSET - BASE_OFFSET) as u32;
        header[SECTION_TABLE_POINTER_OFFSET..HEADER_SIZE].copy_from_slice(&table_pointer.to_be_bytes());

        Self {
            header,
            padding: Vec::new(),
            relocation_address: 0,
            relocation_table: Vec::new(),
            sections: Vec::new(),
            lossy_entries: Vec::new(),
        }
    }
}

impl YtxFile {
    /// Create an empty file with a zeroed header
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a file from sections, anchoring the first one right after the section table.
    pub fn from_sections(sections: Vec<EntrySection>) -> Result<Self> {
        for (index, section) in sections.iter().enumerate() {
            if sections[..index].iter().any(|s| s.id == section.id) {
                return Err(Error::DuplicateSectionId(section.id));
            }
        }

        let mut file = Self {
            sections,
            ..Self::default()
        };
        let table_end = file.section_table_end() - BASE_OFFSET;
        if let Some(first) = file.sections.first_mut() {
            first.base_address = i32::try_from(table_end).map_err(|_| Error::AddressOverflow {
                what: "section table",
            })?;
        }
        Ok(file)
    }

    pub(crate) fn from_parts(
        header: Vec<u8>,
        padding: Vec<u8>,
        relocation_address: i32,
        relocation_table: Vec<u8>,
        sections: Vec<EntrySection>,
    ) -> Self {
        Self {
            header,
            padding,
            relocation_address,
            relocation_table,
            sections,
            lossy_entries: Vec::new(),
        }
    }

    pub(crate) fn with_lossy_entries(mut self, lossy_entries: Vec<(u32, u32)>) -> Self {
        self.lossy_entries = lossy_entries;
        self
    }

    /// Header bytes as they will be written (before field patching)
    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub(crate) fn padding(&self) -> &[u8] {
        &self.padding
    }

    /// Sections in on-disk order
    #[must_use]
    pub fn sections(&self) -> &[EntrySection] {
        &self.sections
    }

    /// Entries loaded from invalid UTF-16, as `(section_id, entry_id)`.
    ///
    /// Their text holds U+FFFD where the file had unpaired surrogates, so a
    /// save does not reproduce the original bytes. An entry leaves this list
    /// once its text is replaced or it is removed.
    #[must_use]
    pub fn lossy_entries(&self) -> &[(u32, u32)] {
        &self.lossy_entries
    }

    pub(crate) fn forget_lossy_entry(&mut self, section_id: u32, entry_id: u32) {
        self.lossy_entries.retain(|&key| key != (section_id, entry_id));
    }

    pub(crate) fn sections_mut(&mut self) -> &mut [EntrySection] {
        &mut self.sections
    }

    /// Absolute offset one past the last section record
    #[must_use]
    pub fn section_table_end(&self) -> usize {
        SECTION_TABLE_OFFSET + self.sections.len() * SECTION_RECORD_SIZE
    }
}
