//! Remote file listing.
//!
//! A storage backend is anything implementing [`RemoteStore`]: it can list a folder (possibly
//! over several pages), continue a listing from a cursor, and hand back a byte stream for a file.
//!
//! Backends shipped with the crate:
//! - [`dropbox::DropboxClient`]: the Dropbox v2 HTTP API
//! - [`local::LocalStore`]: a folder on local disk (e.g. a synced Dropbox directory)
//! - [`memory::MemoryStore`]: in-memory files, for tests and offline runs
//!
//! Most callers only need [`list_files`], which hides pagination entirely.

pub mod dropbox;
pub mod local;
pub mod memory;

use std::io::Read;

use tracing::debug;

use crate::error::{IngestionError, IngestionResult};

pub use dropbox::DropboxClient;
pub use local::LocalStore;
pub use memory::MemoryStore;

/// One entry returned by a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteEntry {
    /// Full path of the entry as reported by the backend.
    pub path: String,
    /// `false` for folders.
    pub is_file: bool,
}

impl RemoteEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_file: true,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_file: false,
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub entries: Vec<RemoteEntry>,
    /// Cursor to pass to [`RemoteStore::list_folder_continue`] when `has_more` is set.
    pub cursor: Option<String>,
    pub has_more: bool,
}

/// Storage backend capability consumed by the lister and the ingestor.
///
/// Implementations surface network/auth failures as
/// [`crate::IngestionError::RemoteUnavailable`] and must not retry on their own behalf beyond
/// what their transport already does.
pub trait RemoteStore: Send + Sync {
    /// Start listing `path`.
    fn list_folder(&self, path: &str, recursive: bool) -> IngestionResult<ListPage>;

    /// Fetch the page following `cursor`.
    fn list_folder_continue(&self, cursor: &str) -> IngestionResult<ListPage>;

    /// Open a byte stream over the file at `path`.
    ///
    /// The stream is released when the returned box is dropped.
    fn download(&self, path: &str) -> IngestionResult<Box<dyn Read + Send>>;
}

enum PageState {
    Start { folder: String },
    Continue { cursor: String },
    Done,
}

/// Lazy sequence of listing pages for one recursive folder listing.
///
/// Finite: it ends after the first page reporting `has_more == false`, or after the first error.
/// A page that reports `has_more` without a cursor is an error.
/// It cannot be rewound; start a new listing with [`Pages::new`] instead.
pub struct Pages<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    state: PageState,
}

impl<'a, S: RemoteStore + ?Sized> Pages<'a, S> {
    pub fn new(store: &'a S, folder: impl Into<String>) -> Self {
        Self {
            store,
            state: PageState::Start {
                folder: folder.into(),
            },
        }
    }
}

impl<S: RemoteStore + ?Sized> Iterator for Pages<'_, S> {
    type Item = IngestionResult<ListPage>;

    fn next(&mut self) -> Option<Self::Item> {
        let (context, result) = match std::mem::replace(&mut self.state, PageState::Done) {
            PageState::Start { folder } => {
                let result = self.store.list_folder(&folder, true);
                (folder, result)
            }
            PageState::Continue { cursor } => {
                let result = self.store.list_folder_continue(&cursor);
                (cursor, result)
            }
            PageState::Done => return None,
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };
        debug!(
            entries = page.entries.len(),
            has_more = page.has_more,
            "listing page received"
        );
        if page.has_more {
            match &page.cursor {
                Some(cursor) => {
                    self.state = PageState::Continue {
                        cursor: cursor.clone(),
                    }
                }
                // Nothing to continue from.
                None => {
                    return Some(Err(IngestionError::RemoteUnavailable {
                        path: context,
                        message: "listing reported more pages but no cursor".to_string(),
                    }));
                }
            }
        }
        Some(Ok(page))
    }
}

/// Recursively list every file under `folder`.
///
/// Pagination is followed until exhausted; folders are dropped. Entries keep backend order.
///
/// ```rust
/// use archival_zone::remote::{list_files, MemoryStore};
///
/// # fn main() -> Result<(), archival_zone::IngestionError> {
/// let store = MemoryStore::new()
///     .with_file("/wy20/a.csv", "ts,val\n")
///     .with_file("/wy20/sub/b.xlsx", Vec::new())
///     .with_page_size(1);
///
/// let files = list_files(&store, "/wy20")?;
/// let paths: Vec<_> = files.iter().map(|e| e.path.as_str()).collect();
/// assert_eq!(paths, ["/wy20/a.csv", "/wy20/sub/b.xlsx"]);
/// # Ok(())
/// # }
/// ```
pub fn list_files<S: RemoteStore + ?Sized>(
    store: &S,
    folder: &str,
) -> IngestionResult<Vec<RemoteEntry>> {
    let mut files = Vec::new();
    let mut pages = 0usize;
    for page in Pages::new(store, folder) {
        let page = page?;
        pages += 1;
        files.extend(page.entries.into_iter().filter(|e| e.is_file));
    }
    debug!(folder, pages, files = files.len(), "listing complete");
    Ok(files)
}

/// Like [`list_files`], returning only the paths.
pub fn list_file_paths<S: RemoteStore + ?Sized>(
    store: &S,
    folder: &str,
) -> IngestionResult<Vec<String>> {
    Ok(list_files(store, folder)?
        .into_iter()
        .map(|e| e.path)
        .collect())
}
