//! Filename filtering with shell-style wildcards.

use glob::{MatchOptions, Pattern};

use crate::error::IngestionResult;
use crate::remote::RemoteEntry;

/// Case-sensitive everywhere; `*` may match a leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Keep the paths whose filename (the text after the last `/`) matches `pattern`.
///
/// Supports `*`, `?`, `[seq]` and `[!seq]`. Matching is case-sensitive on every platform, and the
/// output preserves input order.
///
/// ```rust
/// use archival_zone::filter::filter_by_pattern;
///
/// let paths = ["a/b.csv", "a/c.xlsx", "a/d.CSV"];
/// assert_eq!(filter_by_pattern(&paths, "*.csv").unwrap(), ["a/b.csv"]);
/// ```
pub fn filter_by_pattern<P: AsRef<str>>(
    paths: &[P],
    pattern: &str,
) -> IngestionResult<Vec<String>> {
    let pattern = Pattern::new(pattern)?;
    Ok(paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| pattern.matches_with(file_name(p), MATCH_OPTIONS))
        .map(str::to_string)
        .collect())
}

/// [`filter_by_pattern`] over listing entries. Folders never match.
pub fn filter_entries(
    entries: &[RemoteEntry],
    pattern: &str,
) -> IngestionResult<Vec<RemoteEntry>> {
    let pattern = Pattern::new(pattern)?;
    Ok(entries
        .iter()
        .filter(|e| e.is_file && pattern.matches_with(file_name(&e.path), MATCH_OPTIONS))
        .cloned()
        .collect())
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
