//! YTX editing operations
//!
//! Provides functions for modifying a loaded [`YtxFile`]:
//! - Add, remove, and edit entries
//! - Look up sections and entries by id
//! - Search entry text
//!
//! Every operation either succeeds completely or leaves the file untouched.
//! String addresses are resolved on the next reassembly.

use super::{Entry, EntrySection, YtxFile};
use crate::error::{Error, Result};

// ============================================================================
// YtxFile editing methods
// ============================================================================

impl YtxFile {
    /// Get a section by id
    #[must_use]
    pub fn section(&self, id: u32) -> Option<&EntrySection> {
        self.sections.iter().find(|s| s.id == id)
    }

    fn section_mut_or_err(&mut self, id: u32) -> Result<&mut EntrySection> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::InvalidSection(id))
    }

    /// Get an entry by entry id and section id
    #[must_use]
    pub fn entry(&self, entry_id: u32, section_id: u32) -> Option<&Entry> {
        self.section(section_id)?.entry(entry_id)
    }

    /// Add a new entry to the end of a section
    ///
    /// The entry's string address stays unset until the next reassembly.
    ///
    /// # Errors
    /// - [`Error::InvalidSection`] if no section has `section_id`
    /// - [`Error::DuplicateEntryId`] if the section already holds `entry_id`
    pub fn add_entry(
        &mut self,
        text: impl Into<String>,
        entry_id: u32,
        section_id: u32,
    ) -> Result<()> {
        let section = self.section_mut_or_err(section_id)?;
        section.push_entry(Entry::new(entry_id, text))?;

        tracing::debug!(
            "Added entry 0x{:x} to section 0x{:x} ({} entries)",
            entry_id,
            section_id,
            section.entry_count()
        );
        Ok(())
    }

    /// Remove an entry from a section
    ///
    /// # Returns
    /// The removed entry
    ///
    /// # Errors
    /// - [`Error::InvalidSection`] if no section has `section_id`
    /// - [`Error::EntryNotFound`] if the section has no entry `entry_id`
    pub fn remove_entry(&mut self, entry_id: u32, section_id: u32) -> Result<Entry> {
        let section = self.section_mut_or_err(section_id)?;
        let removed = section.remove_entry(entry_id)?;

        tracing::debug!(
            "Removed entry 0x{:x} from section 0x{:x} ({} entries left)",
            entry_id,
            section_id,
            section.entry_count()
        );
        self.forget_lossy_entry(section_id, entry_id);
        Ok(removed)
    }

    /// Replace an existing entry's text
    ///
    /// # Returns
    /// The previous text
    ///
    /// # Errors
    /// - [`Error::InvalidSection`] if no section has `section_id`
    /// - [`Error::EntryNotFound`] if the section has no entry `entry_id`
    pub fn set_entry_text(
        &mut self,
        entry_id: u32,
        section_id: u32,
        text: impl Into<String>,
    ) -> Result<String> {
        let section = self.section_mut_or_err(section_id)?;
        let entry = section
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(Error::EntryNotFound {
                entry: entry_id,
                section: section_id,
            })?;

        let previous = std::mem::replace(&mut entry.text, text.into());
        self.forget_lossy_entry(section_id, entry_id);
        Ok(previous)
    }

    /// Total number of entries across all sections
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(EntrySection::len).sum()
    }

    /// Iterate over `(section_id, entry)` pairs in on-disk order
    pub fn iter_entries(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter().map(move |e| (s.id, e)))
    }

    /// Find entries containing text
    ///
    /// # Arguments
    /// * `query` - Text to search for
    /// * `case_sensitive` - Whether to match case
    ///
    /// # Returns
    /// `(section_id, entry)` pairs of matching entries
    #[must_use]
    pub fn find_entries(&self, query: &str, case_sensitive: bool) -> Vec<(u32, &Entry)> {
        if case_sensitive {
            self.iter_entries()
                .filter(|(_, e)| e.text.contains(query))
                .collect()
        } else {
            let query_lower = query.to_lowercase();
            self.iter_entries()
                .filter(|(_, e)| e.text.to_lowercase().contains(&query_lower))
                .collect()
        }
    }
}
