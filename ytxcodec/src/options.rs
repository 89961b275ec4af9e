//! Load and save options for `.ytx` documents
//!
//! This module controls where a document is saved and whether a backup of
//! the loaded bytes is written next to the source file.

use std::path::PathBuf;

/// Default suffix appended to the source path for saved output
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".out";

/// Default suffix appended to the source path for the backup copy
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Where [`YtxDocument::save_changes`](crate::YtxDocument::save_changes) writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Next to the source, at the source path plus this suffix
    Suffix(String),
    /// Overwrite the source file
    InPlace,
    /// An explicit path
    Path(PathBuf),
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self::Suffix(DEFAULT_OUTPUT_SUFFIX.to_string())
    }
}

impl OutputTarget {
    /// Resolve the output path for a (normalized) source path.
    #[must_use]
    pub fn resolve(&self, source: &str) -> PathBuf {
        match self {
            Self::Suffix(suffix) => PathBuf::from(format!("{source}{suffix}")),
            Self::InPlace => PathBuf::from(source),
            Self::Path(path) => path.clone(),
        }
    }
}

/// Options for loading and saving `.ytx` documents.
///
/// # Example
///
/// ```no_run
/// use ytxcodec::{OutputTarget, YtxOptions};
///
/// // Save over the source, without writing a backup
/// let options = YtxOptions::new()
///     .with_output(OutputTarget::InPlace)
///     .with_create_backup(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtxOptions {
    /// Write a one-time copy of the loaded bytes next to the source
    /// Default: true
    pub create_backup: bool,

    /// Suffix appended to the source path for the backup
    /// Default: `.bak`
    pub backup_suffix: String,

    /// Where saved files go
    /// Default: source path + `.out`
    pub output: OutputTarget,
}

impl Default for YtxOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            output: OutputTarget::default(),
        }
    }
}

impl YtxOptions {
    /// Create options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to write a backup after loading.
    #[must_use]
    pub fn with_create_backup(mut self, create: bool) -> Self {
        self.create_backup = create;
        self
    }

    /// Set the backup suffix.
    #[must_use]
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    /// Backup path for a (normalized) source path.
    #[must_use]
    pub fn backup_path(&self, source: &str) -> PathBuf {
        PathBuf::from(format!("{source}{}", self.backup_suffix))
    }
}
