//! Path utilities

use std::path::Path;

/// Normalize a user-supplied path for storage and comparison.
///
/// Trims surrounding whitespace, strips surrounding quotes (as left behind by
/// "copy as path" on Windows) and converts backslashes to forward slashes.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .to_string_lossy()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .replace('\\', "/")
}

/// Compare two paths after normalizing both
pub fn paths_equal<A: AsRef<Path>, B: AsRef<Path>>(a: A, b: B) -> bool {
    normalize_path(a) == normalize_path(b)
}

/// Last component of a normalized path
pub fn file_name(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}
