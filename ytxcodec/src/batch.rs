//! Batch `.ytx` operations
//!
//! File discovery and parallel statistics over many string tables.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Result;
use crate::formats::ytx::{YtxFile, read_ytx};

/// Statistics for one `.ytx` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YtxStats {
    /// Source file
    pub path: PathBuf,
    /// Number of entry sections
    pub sections: usize,
    /// Number of entries across all sections
    pub entries: usize,
    /// Unicode scalar values across all entry texts
    pub characters: usize,
    /// Bytes occupied by encoded strings
    pub string_bytes: usize,
    /// Entries with empty text
    pub empty_entries: usize,
    /// Size of the POF0 table
    pub relocation_size: usize,
}

impl YtxStats {
    /// Gather statistics from a parsed file
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>, file: &YtxFile) -> Self {
        let mut stats = Self {
            path: path.into(),
            sections: file.sections().len(),
            relocation_size: file.relocation_table.len(),
            ..Self::default()
        };

        for section in file.sections() {
            stats.string_bytes += section.string_area_size();
            for entry in section.entries() {
                stats.entries += 1;
                stats.characters += entry.text.chars().count();
                if entry.text.is_empty() {
                    stats.empty_entries += 1;
                }
            }
        }
        stats
    }

    /// Add another file's counts to this one
    pub fn accumulate(&mut self, other: &Self) {
        self.sections += other.sections;
        self.entries += other.entries;
        self.characters += other.characters;
        self.string_bytes += other.string_bytes;
        self.empty_entries += other.empty_entries;
        self.relocation_size += other.relocation_size;
    }
}

/// Result of a batch statistics run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    /// Per-file statistics, in input order
    pub files: Vec<YtxStats>,
    /// Files that could not be loaded, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchStats {
    /// Sum of all successfully loaded files
    #[must_use]
    pub fn total(&self) -> YtxStats {
        let mut total = YtxStats::default();
        for stats in &self.files {
            total.accumulate(stats);
        }
        total
    }
}

/// Find all .ytx files in a directory recursively
///
/// # Arguments
/// * `dir` - Directory to search
///
/// # Returns
/// A sorted list of paths to .ytx files found in the directory tree.
pub fn find_ytx_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut ytx_files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ytx"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    ytx_files.sort();
    ytx_files
}

/// Load one file and gather its statistics
///
/// # Errors
/// Returns any error from [`read_ytx`].
pub fn file_stats<P: AsRef<Path>>(path: P) -> Result<YtxStats> {
    let path = path.as_ref();
    let file = read_ytx(path)?;
    Ok(YtxStats::from_file(path, &file))
}

/// Gather statistics for many files in parallel
///
/// # Arguments
/// * `paths` - Files to load
/// * `progress` - Called with `(current, total, path)` as each file starts
pub fn collect_stats<F>(paths: &[PathBuf], progress: F) -> BatchStats
where
    F: Fn(usize, usize, &Path) + Send + Sync,
{
    let processed = AtomicUsize::new(0);
    let total = paths.len();

    let results: Vec<std::result::Result<YtxStats, (PathBuf, String)>> = paths
        .par_iter()
        .map(|path| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(current, total, path);

            file_stats(path).map_err(|e| {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                (path.clone(), e.to_string())
            })
        })
        .collect();

    let mut batch = BatchStats::default();
    for result in results {
        match result {
            Ok(stats) => batch.files.push(stats),
            Err(failure) => batch.failures.push(failure),
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ytx::{Entry, EntrySection, write_ytx};

    fn write_file(path: &Path, texts: &[&str]) {
        let mut section = EntrySection::new(1);
        for (index, text) in texts.iter().enumerate() {
            section.push_entry(Entry::new(index as u32, *text)).unwrap();
        }
        let mut file = YtxFile::from_sections(vec![section]).unwrap();
        write_ytx(path, &mut file).unwrap();
    }

    #[test]
    fn test_find_ytx_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_file(&dir.path().join("b.ytx"), &["x"]);
        write_file(&dir.path().join("nested/a.YTX"), &["y"]);
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let found = find_ytx_files(dir.path());
        assert_eq!(
            found,
            vec![dir.path().join("b.ytx"), dir.path().join("nested/a.YTX")]
        );
    }

    #[test]
    fn test_collect_stats() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("one.ytx");
        let second = dir.path().join("two.ytx");
        let broken = dir.path().join("broken.ytx");
        write_file(&first, &["Hi", ""]);
        write_file(&second, &["Caf\u{e9}"]);
        std::fs::write(&broken, b"short").unwrap();

        let calls = AtomicUsize::new(0);
        let batch = collect_stats(&[first.clone(), second, broken.clone()], |_, total, _| {
            assert_eq!(total, 3);
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert_eq!(batch.files.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].0, broken);

        let one = &batch.files[0];
        assert_eq!(one.path, first);
        assert_eq!(one.entries, 2);
        assert_eq!(one.characters, 2);
        assert_eq!(one.empty_entries, 1);
        // "Hi" = 8 bytes, "" = 4 bytes
        assert_eq!(one.string_bytes, 12);

        let total = batch.total();
        assert_eq!(total.sections, 2);
        assert_eq!(total.entries, 3);
        assert_eq!(total.characters, 6);
    }
}
