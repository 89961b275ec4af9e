//! Loaded `.ytx` document
//!
//! [`YtxDocument`] owns one file's path, its parsed model, and the bytes it
//! was loaded from. Callers drive it as load, then any number of edits, then
//! [`save_changes`](YtxDocument::save_changes). Opening a different file
//! means creating a new document.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, Warning};
use crate::formats::ytx::{self, Entry, EntrySection, Reassembled, YtxFile};
use crate::options::YtxOptions;
use crate::utils::{file_name, normalize_path, paths_equal};

/// Summary of a successful save
#[derive(Debug, Clone)]
pub struct SaveReport {
    /// Where the file was written
    pub path: PathBuf,
    /// Total bytes written
    pub bytes_written: usize,
    /// Size of the regenerated POF0 table
    pub relocation_size: usize,
    /// Non-fatal issues found while reassembling
    pub warnings: Vec<Warning>,
}

/// A `.ytx` file opened for editing
#[derive(Debug, Clone)]
pub struct YtxDocument {
    path: String,
    name: String,
    options: YtxOptions,
    raw: Vec<u8>,
    file: YtxFile,
    valid: bool,
    has_backup: bool,
}

impl YtxDocument {
    /// Create an unloaded document with default options
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] if the path is empty after normalization.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, YtxOptions::default())
    }

    /// Create an unloaded document
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] if the path is empty after normalization.
    pub fn with_options<P: AsRef<Path>>(path: P, options: YtxOptions) -> Result<Self> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(Error::InvalidPath(path));
        }
        let name = file_name(&path).to_string();

        Ok(Self {
            path,
            name,
            options,
            raw: Vec::new(),
            file: YtxFile::new(),
            valid: false,
            has_backup: false,
        })
    }

    /// Create and load a document in one step
    ///
    /// # Errors
    /// Returns any error from [`new`](Self::new) or [`load`](Self::load).
    pub fn open<P: AsRef<Path>>(path: P, options: YtxOptions) -> Result<Self> {
        let mut document = Self::with_options(path, options)?;
        document.load()?;
        Ok(document)
    }

    /// Read and parse the file at this document's path
    ///
    /// On failure the document is left invalid with an empty model.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read, or the structural
    /// error that stopped the load.
    pub fn load(&mut self) -> Result<()> {
        tracing::info!("Loading file: {}", self.path);
        self.valid = false;
        self.file = YtxFile::new();
        self.raw.clear();

        let parsed = std::fs::read(&self.path)
            .map_err(Error::from)
            .and_then(|raw| ytx::parse_ytx_bytes(&raw).map(|file| (raw, file)));
        let (raw, file) = match parsed {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Unable to load file {}: {}", self.path, e);
                return Err(e);
            }
        };

        self.raw = raw;
        self.file = file;
        self.valid = true;
        tracing::info!(
            "Loaded {}: {} sections, {} entries",
            self.name,
            self.file.sections().len(),
            self.file.entry_count()
        );

        // A missing backup is retried before the first save
        if let Err(e) = self.ensure_backup() {
            tracing::warn!("Could not write backup for {}: {}", self.path, e);
        }
        Ok(())
    }

    /// Whether the last load succeeded
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether a backup of the loaded bytes exists on disk
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.has_backup
    }

    /// Compare a user-supplied path with this document's path after normalizing it
    #[must_use]
    pub fn compare_path<P: AsRef<Path>>(&self, candidate: P) -> bool {
        paths_equal(candidate, &self.path)
    }

    /// Normalized source path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name component of the path
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &YtxOptions {
        &self.options
    }

    /// Parsed model
    #[must_use]
    pub fn file(&self) -> &YtxFile {
        &self.file
    }

    /// Sections in on-disk order
    #[must_use]
    pub fn sections(&self) -> &[EntrySection] {
        self.file.sections()
    }

    /// Bytes of the last load or save
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Add a new entry to a section
    ///
    /// # Errors
    /// [`Error::DocumentNotLoaded`], [`Error::InvalidSection`] or
    /// [`Error::DuplicateEntryId`].
    pub fn add_entry(
        &mut self,
        text: impl Into<String>,
        entry_id: u32,
        section_id: u32,
    ) -> Result<()> {
        self.ensure_loaded()?;
        self.file.add_entry(text, entry_id, section_id)
    }

    /// Remove an entry from a section
    ///
    /// # Errors
    /// [`Error::DocumentNotLoaded`], [`Error::InvalidSection`] or
    /// [`Error::EntryNotFound`].
    pub fn remove_entry(&mut self, entry_id: u32, section_id: u32) -> Result<Entry> {
        self.ensure_loaded()?;
        self.file.remove_entry(entry_id, section_id)
    }

    /// Replace an entry's text, returning the previous text
    ///
    /// # Errors
    /// [`Error::DocumentNotLoaded`], [`Error::InvalidSection`] or
    /// [`Error::EntryNotFound`].
    pub fn set_entry_text(
        &mut self,
        entry_id: u32,
        section_id: u32,
        text: impl Into<String>,
    ) -> Result<String> {
        self.ensure_loaded()?;
        self.file.set_entry_text(entry_id, section_id, text)
    }

    /// Rebuild the file contents without writing them
    ///
    /// # Errors
    /// [`Error::DocumentNotLoaded`] or any reassembly error.
    pub fn reassemble(&mut self) -> Result<Reassembled> {
        self.ensure_loaded()?;
        ytx::reassemble(&mut self.file)
    }

    /// Path that [`save_changes`](Self::save_changes) writes to
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.options.output.resolve(&self.path)
    }

    /// Reassemble the document and write it to the output path
    ///
    /// # Errors
    /// [`Error::DocumentNotLoaded`], a backup or write failure, or any
    /// reassembly error. Nothing is written when an error is returned
    /// before the final write.
    pub fn save_changes(&mut self) -> Result<SaveReport> {
        self.ensure_loaded()?;
        self.ensure_backup()?;

        let reassembled = ytx::reassemble(&mut self.file)?;
        let path = self.output_path();
        tracing::info!("Saving {} to {}", self.name, path.display());

        if let Err(e) = std::fs::write(&path, &reassembled.bytes) {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            return Err(e.into());
        }

        let report = SaveReport {
            path,
            bytes_written: reassembled.bytes.len(),
            relocation_size: self.file.relocation_table.len(),
            warnings: reassembled.warnings,
        };
        self.raw = reassembled.bytes;
        Ok(report)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::DocumentNotLoaded(self.path.clone()))
        }
    }

    /// Write the loaded bytes next to the source, once.
    ///
    /// An existing file at the backup path is never overwritten.
    fn ensure_backup(&mut self) -> Result<()> {
        if self.has_backup || !self.options.create_backup {
            return Ok(());
        }

        let backup = self.options.backup_path(&self.path);
        if backup.exists() {
            tracing::info!("Keeping existing backup {}", backup.display());
        } else {
            std::fs::write(&backup, &self.raw)?;
            tracing::info!("Backup written to {}", backup.display());
        }
        self.has_backup = true;
        Ok(())
    }
}
