//! Error types for `ytxcodec`

use std::fmt;

use thiserror::Error;

/// Stage of the loader that was running when a read went out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Fixed header fields (section count, relocation address).
    Header,
    /// POF0 relocation table bytes.
    Relocation,
    /// 12-byte section records.
    SectionTable,
    /// 8-byte entry records.
    EntryTable,
    /// UTF-16BE string blobs.
    Strings,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Relocation => "relocation table",
            Self::SectionTable => "section table",
            Self::EntryTable => "entry table",
            Self::Strings => "string data",
        };
        f.write_str(name)
    }
}

/// The error type for `ytxcodec` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations (missing or unreadable file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document path is empty or unusable.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    // ==================== Load Errors ====================
    /// The buffer is too short to contain the fixed header.
    #[error("malformed header: file is {len} bytes, header needs 0x28")]
    MalformedHeader {
        /// Length of the buffer.
        len: usize,
    },

    /// The relocation table address is non-positive or past the end of the file.
    #[error("invalid POF0 address 0x{address:x} for a file of {len} bytes")]
    InvalidRelocationAddress {
        /// Address read from the header (relative to the base offset).
        address: i32,
        /// Length of the buffer.
        len: usize,
    },

    /// A record or string lies outside the buffer.
    #[error("{stage} out of bounds: offset 0x{offset:x} in a file of {len} bytes")]
    OutOfBounds {
        /// Loader stage that attempted the read.
        stage: LoadStage,
        /// Absolute offset of the failed read.
        offset: usize,
        /// Length of the buffer.
        len: usize,
    },

    /// A UTF-16 string runs to the end of the buffer without a NUL terminator.
    #[error("unterminated string at offset 0x{offset:x}")]
    UnterminatedString {
        /// Absolute offset where the string starts.
        offset: usize,
    },

    // ==================== Edit Errors ====================
    /// No section with the given id exists.
    #[error("invalid section: 0x{0:x}")]
    InvalidSection(u32),

    /// The entry does not exist in the section.
    #[error("entry 0x{entry:x} not found in section 0x{section:x}")]
    EntryNotFound {
        /// Entry id that was looked up.
        entry: u32,
        /// Section id that was searched.
        section: u32,
    },

    /// An entry with the same id already exists in the section.
    #[error("duplicate entry id 0x{entry:x} in section 0x{section:x}")]
    DuplicateEntryId {
        /// Entry id that collided.
        entry: u32,
        /// Section id holding the existing entry.
        section: u32,
    },

    /// Two sections share the same id.
    #[error("duplicate section id 0x{0:x}")]
    DuplicateSectionId(u32),

    /// The document has not been loaded successfully.
    #[error("document is not loaded: {0}")]
    DocumentNotLoaded(String),

    // ==================== Reassembly Errors ====================
    /// The first section is anchored inside the section table.
    #[error("first section at 0x{anchor:x} overlaps the section table ending at 0x{table_end:x}")]
    SectionTableOverlap {
        /// Address of the first section (relative to base).
        anchor: i64,
        /// End of the section table (relative to base).
        table_end: i64,
    },

    /// An offset or count no longer fits its 32-bit field.
    #[error("{what} does not fit in a 32-bit field")]
    AddressOverflow {
        /// What overflowed.
        what: &'static str,
    },

    /// A section's string area cannot be expressed as a POF0 gap marker.
    #[error("section 0x{section:x} string area of {words} words cannot be encoded in POF0")]
    GapMarkerOverflow {
        /// Section id.
        section: u32,
        /// Size of the string area in 4-byte words.
        words: u64,
    },

    /// The POF0 block could not be decoded.
    #[error("invalid POF0 table: {0}")]
    InvalidRelocationTable(String),

    // ==================== Task Errors ====================
    /// A background task stopped without delivering a result.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}

/// Non-fatal conditions reported while reassembling a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A string blob or a section's string area is not a multiple of 4 bytes.
    Alignment {
        /// Section id.
        section: u32,
        /// Entry id, or `None` when the whole string area is misaligned.
        entry: Option<u32>,
        /// Size in bytes that failed the check.
        size: usize,
    },
    /// An entry held invalid UTF-16 when loaded and is written with
    /// replacement characters in place of the original code units.
    LossyText {
        /// Section id.
        section: u32,
        /// Entry id.
        entry: u32,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alignment {
                section,
                entry: Some(entry),
                size,
            } => write!(
                f,
                "string of entry 0x{entry:x} in section 0x{section:x} is {size} bytes (not 4-byte aligned)"
            ),
            Self::Alignment {
                section,
                entry: None,
                size,
            } => write!(
                f,
                "string area of section 0x{section:x} is {size} bytes (not 4-byte aligned)"
            ),
            Self::LossyText { section, entry } => write!(
                f,
                "entry 0x{entry:x} in section 0x{section:x} held invalid UTF-16; its original code units are replaced"
            ),
        }
    }
}

/// A specialized Result type for `ytxcodec` operations.
pub type Result<T> = std::result::Result<T, Error>;
