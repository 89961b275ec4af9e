//! # ytxcodec
//!
//! Reader, editor and writer for `.ytx` localized string tables.
//!
//! A `.ytx` file stores groups of UTF-16 strings keyed by section and entry
//! ids, followed by a POF0 relocation table listing every pointer field so
//! the game can patch them after loading. Saving rebuilds every offset and
//! regenerates the relocation table.
//!
//! ## Quick Start
//!
//! ### Editing a File
//!
//! ```no_run
//! use ytxcodec::{YtxDocument, YtxOptions};
//!
//! let mut doc = YtxDocument::open("text/menu.ytx", YtxOptions::default())?;
//! doc.add_entry("New line", 0x42, 0x1)?;
//! doc.remove_entry(0x10, 0x2)?;
//!
//! // Written to text/menu.ytx.out; a backup went to text/menu.ytx.bak on load
//! let report = doc.save_changes()?;
//! println!("Wrote {} bytes", report.bytes_written);
//! # Ok::<(), ytxcodec::Error>(())
//! ```
//!
//! ### Working with the Format Directly
//!
//! ```no_run
//! use ytxcodec::formats::ytx::{read_ytx, serialize_ytx};
//!
//! let mut file = read_ytx("menu.ytx")?;
//! for (section, entry) in file.iter_entries() {
//!     println!("0x{section:x}/0x{:x}: {}", entry.id, entry.text);
//! }
//! let bytes = serialize_ytx(&mut file)?;
//! # Ok::<(), ytxcodec::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use ytxcodec::prelude::*;
//!
//! // Now you have access to:
//! // - YtxDocument, YtxOptions, OutputTarget
//! // - YtxFile, EntrySection, Entry
//! // - Error, Result, Warning, and more
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `ytxcodec` command-line binary

pub mod batch;
pub mod document;
pub mod error;
pub mod formats;
pub mod options;
pub mod tasks;
pub mod utils;

// Re-exports for convenience
pub use document::{SaveReport, YtxDocument};
pub use error::{Error, Result, Warning};
pub use options::{OutputTarget, YtxOptions};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::document::{SaveReport, YtxDocument};
    pub use crate::error::{Error, LoadStage, Result, Warning};
    pub use crate::options::{OutputTarget, YtxOptions};

    pub use crate::formats::ytx::{
        Entry, EntrySection, Reassembled, YtxFile, decode_pof0, decode_pof0_within,
        parse_ytx_bytes, read_ytx, reassemble, serialize_ytx, write_ytx,
    };

    // Background and batch operations
    pub use crate::batch::{BatchStats, YtxStats, collect_stats, find_ytx_files};
    pub use crate::tasks::{SaveOutcome, TaskHandle, spawn_load, spawn_save};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
