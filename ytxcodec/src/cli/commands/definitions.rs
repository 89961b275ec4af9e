//! Shared argument definitions for CLI

use std::path::PathBuf;

use clap::Args;

use crate::options::{DEFAULT_BACKUP_SUFFIX, OutputTarget, YtxOptions};

/// Where edits are saved and whether a backup is kept
#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    /// Overwrite the source file instead of writing <file>.out
    #[arg(long, conflicts_with = "output")]
    pub in_place: bool,

    /// Write the result to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write a backup of the original file
    #[arg(long)]
    pub no_backup: bool,

    /// Suffix for the backup file
    #[arg(long, default_value = DEFAULT_BACKUP_SUFFIX)]
    pub backup_suffix: String,

    /// Suppress extra output
    #[arg(short, long)]
    pub quiet: bool,
}

impl SaveArgs {
    /// Build document options from the flags
    #[must_use]
    pub fn options(&self) -> YtxOptions {
        let output = match (&self.output, self.in_place) {
            (Some(path), _) => OutputTarget::Path(path.clone()),
            (None, true) => OutputTarget::InPlace,
            (None, false) => OutputTarget::default(),
        };

        YtxOptions::new()
            .with_create_backup(!self.no_backup)
            .with_backup_suffix(self.backup_suffix.clone())
            .with_output(output)
    }
}

/// Parse a section or entry id given as `0x`-prefixed hex or decimal
pub fn parse_id(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("Invalid id '{s}': {e} (use decimal or 0x-prefixed hex)"))
}
