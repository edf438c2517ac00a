//! In-memory [`RemoteStore`], for tests and offline runs.

use std::collections::HashSet;
use std::io::{Cursor, Read};

use crate::error::{IngestionError, IngestionResult};

use super::{ListPage, RemoteEntry, RemoteStore};

/// Files held in memory, listed in insertion order.
///
/// Listings include the intermediate folder entries (like a real backend would) and can be split
/// into pages of `page_size` entries to exercise cursor handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Vec<(String, Vec<u8>)>,
    unavailable: HashSet<String>,
    page_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let contents = contents.into();
        match self.files.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = contents,
            None => self.files.push((path, contents)),
        }
        self
    }

    /// Make downloads of `path` fail with [`IngestionError::RemoteUnavailable`].
    pub fn with_unavailable(mut self, path: impl Into<String>) -> Self {
        self.unavailable.insert(path.into());
        self
    }

    /// Split listings into pages of at most `page_size` entries (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    fn entries_under(&self, folder: &str, recursive: bool) -> IngestionResult<Vec<RemoteEntry>> {
        let prefix = folder.trim_end_matches('/');
        let mut seen_folders: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();

        for (path, _) in &self.files {
            let Some(rest) = path.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) else {
                continue;
            };
            let parts: Vec<&str> = rest.split('/').collect();
            if !recursive && parts.len() > 1 {
                if seen_folders.insert(format!("{prefix}/{}", parts[0])) {
                    entries.push(RemoteEntry::folder(format!("{prefix}/{}", parts[0])));
                }
                continue;
            }
            let mut current = prefix.to_string();
            for part in &parts[..parts.len() - 1] {
                current = format!("{current}/{part}");
                if seen_folders.insert(current.clone()) {
                    entries.push(RemoteEntry::folder(current.clone()));
                }
            }
            entries.push(RemoteEntry::file(path.clone()));
        }

        if entries.is_empty() && !prefix.is_empty() {
            return Err(IngestionError::RemoteUnavailable {
                path: folder.to_string(),
                message: "path not found".to_string(),
            });
        }
        Ok(entries)
    }

    fn page_at(&self, folder: &str, recursive: bool, offset: usize) -> IngestionResult<ListPage> {
        let entries = self.entries_under(folder, recursive)?;
        let size = self.page_size.unwrap_or(entries.len().max(1));
        let end = (offset + size).min(entries.len());
        let has_more = end < entries.len();
        Ok(ListPage {
            entries: entries[offset.min(end)..end].to_vec(),
            cursor: has_more.then(|| encode_cursor(end, recursive, folder)),
            has_more,
        })
    }
}

fn encode_cursor(offset: usize, recursive: bool, folder: &str) -> String {
    format!("{offset}:{}:{folder}", u8::from(recursive))
}

fn decode_cursor(cursor: &str) -> Option<(usize, bool, &str)> {
    let mut parts = cursor.splitn(3, ':');
    let offset = parts.next()?.parse().ok()?;
    let recursive = parts.next()? == "1";
    let folder = parts.next()?;
    Some((offset, recursive, folder))
}

impl RemoteStore for MemoryStore {
    fn list_folder(&self, path: &str, recursive: bool) -> IngestionResult<ListPage> {
        self.page_at(path, recursive, 0)
    }

    fn list_folder_continue(&self, cursor: &str) -> IngestionResult<ListPage> {
        let (offset, recursive, folder) =
            decode_cursor(cursor).ok_or_else(|| IngestionError::RemoteUnavailable {
                path: cursor.to_string(),
                message: "invalid cursor".to_string(),
            })?;
        self.page_at(folder, recursive, offset)
    }

    fn download(&self, path: &str) -> IngestionResult<Box<dyn Read + Send>> {
        if self.unavailable.contains(path) {
            return Err(IngestionError::RemoteUnavailable {
                path: path.to_string(),
                message: "download failed".to_string(),
            });
        }
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, bytes)| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read + Send>)
            .ok_or_else(|| IngestionError::RemoteUnavailable {
                path: path.to_string(),
                message: "path not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::MemoryStore;
    use crate::error::ErrorKind;
    use crate::remote::{list_files, RemoteEntry, RemoteStore};

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_file("/wy20/a.csv", "a")
            .with_file("/wy20/logger/b.csv", "b")
            .with_file("/wy20/logger/deep/c.xls", "c")
            .with_file("/wy21/d.csv", "d")
    }

    #[test]
    fn recursive_listing_includes_folders() {
        let page = store().list_folder("/wy20", true).unwrap();
        assert!(!page.has_more);
        assert_eq!(
            page.entries,
            vec![
                RemoteEntry::file("/wy20/a.csv"),
                RemoteEntry::folder("/wy20/logger"),
                RemoteEntry::file("/wy20/logger/b.csv"),
                RemoteEntry::folder("/wy20/logger/deep"),
                RemoteEntry::file("/wy20/logger/deep/c.xls"),
            ]
        );
    }

    #[test]
    fn non_recursive_listing_stops_at_children() {
        let page = store().list_folder("/wy20", false).unwrap();
        assert_eq!(
            page.entries,
            vec![
                RemoteEntry::file("/wy20/a.csv"),
                RemoteEntry::folder("/wy20/logger"),
            ]
        );
    }

    #[test]
    fn root_listing_covers_everything() {
        let files = list_files(&store(), "").unwrap();
        assert_eq!(files.len(), 4);
        let files = list_files(&store(), "/").unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn paged_listing_matches_unpaged() {
        let unpaged = list_files(&store(), "/wy20").unwrap();
        for size in 1..=6 {
            let paged = list_files(&store().with_page_size(size), "/wy20").unwrap();
            assert_eq!(paged, unpaged, "page size {size}");
        }
    }

    #[test]
    fn missing_folder_is_remote_unavailable() {
        let err = store().list_folder("/nope", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    }

    #[test]
    fn download_returns_contents_or_error() {
        let s = store().with_unavailable("/wy21/d.csv");
        let mut buf = String::new();
        s.download("/wy20/a.csv")
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "a");

        assert!(s.download("/wy21/d.csv").is_err());
        assert!(s.download("/wy20/zzz.csv").is_err());
    }
}
