use std::path::PathBuf;

use clap::Subcommand;

pub mod definitions;
pub mod execute;
pub mod ytx;

pub use definitions::{SaveArgs, parse_id};

#[derive(Subcommand)]
pub enum Commands {
    /// Show header values, sections and relocation info
    Info {
        /// .ytx file to inspect
        path: PathBuf,
    },

    /// List entries
    List {
        /// .ytx file to list
        path: PathBuf,

        /// Only list this section
        #[arg(short, long, value_parser = parse_id)]
        section: Option<u32>,

        /// Maximum entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one entry's text
    Get {
        /// .ytx file to read
        path: PathBuf,

        /// Section id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        section: u32,

        /// Entry id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        id: u32,
    },

    /// Replace an entry's text and save
    Set {
        /// .ytx file to edit
        path: PathBuf,

        /// Section id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        section: u32,

        /// Entry id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        id: u32,

        /// New text
        text: String,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Append a new entry to a section and save
    Add {
        /// .ytx file to edit
        path: PathBuf,

        /// Section id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        section: u32,

        /// New entry id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        id: u32,

        /// Entry text
        text: String,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Remove an entry and save
    Remove {
        /// .ytx file to edit
        path: PathBuf,

        /// Section id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        section: u32,

        /// Entry id (decimal or 0x hex)
        #[arg(value_parser = parse_id)]
        id: u32,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Search entry text
    Search {
        /// .ytx file to search
        path: PathBuf,

        /// Search term
        query: String,

        /// Match case
        #[arg(short, long)]
        case_sensitive: bool,

        /// Maximum results to return
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Suppress extra output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show statistics for files or directories of .ytx files
    Stats {
        /// Files or directories (searched recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reassemble without edits and compare with the input
    Verify {
        /// .ytx file to verify
        path: PathBuf,
    },

    /// Dump the pointer offsets listed in the POF0 table
    Relocs {
        /// .ytx file to inspect
        path: PathBuf,
    },
}
