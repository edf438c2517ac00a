//! [`RemoteStore`] over a local directory tree.
//!
//! Useful when the Dropbox folder is synced to disk: remote-style paths (`/wy20/site.csv`) are
//! resolved against a root directory.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IngestionError, IngestionResult};

use super::{ListPage, RemoteEntry, RemoteStore};

/// A directory on local disk, exposed through the [`RemoteStore`] interface.
///
/// Listings are returned as a single page, sorted by file name within each directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let rel = path.trim_start_matches('/');
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    fn to_remote_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/{}", parts.join("/")))
    }
}

impl RemoteStore for LocalStore {
    fn list_folder(&self, path: &str, recursive: bool) -> IngestionResult<ListPage> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Err(IngestionError::RemoteUnavailable {
                path: path.to_string(),
                message: format!("not a directory: {}", dir.display()),
            });
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestionError::RemoteUnavailable {
                path: path.to_string(),
                message: e.to_string(),
            })?;
            let Some(remote) = self.to_remote_path(entry.path()) else {
                continue;
            };
            entries.push(RemoteEntry {
                path: remote,
                is_file: entry.file_type().is_file(),
            });
        }

        Ok(ListPage {
            entries,
            cursor: None,
            has_more: false,
        })
    }

    fn list_folder_continue(&self, cursor: &str) -> IngestionResult<ListPage> {
        Err(IngestionError::RemoteUnavailable {
            path: cursor.to_string(),
            message: "local listings are never paginated".to_string(),
        })
    }

    fn download(&self, path: &str) -> IngestionResult<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(path)).map_err(|e| IngestionError::RemoteUnavailable {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use super::LocalStore;
    use crate::error::ErrorKind;
    use crate::remote::{list_file_paths, RemoteStore};

    #[test]
    fn lists_nested_files_with_remote_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("wy20/logger")).unwrap();
        fs::write(dir.path().join("wy20/b.csv"), "b").unwrap();
        fs::write(dir.path().join("wy20/a.csv"), "a").unwrap();
        fs::write(dir.path().join("wy20/logger/c.xls"), "c").unwrap();

        let store = LocalStore::new(dir.path());
        let paths = list_file_paths(&store, "/wy20").unwrap();
        assert_eq!(paths, ["/wy20/a.csv", "/wy20/b.csv", "/wy20/logger/c.xls"]);

        let shallow = store.list_folder("/wy20", false).unwrap();
        assert_eq!(shallow.entries.len(), 3);
        assert_eq!(shallow.entries.iter().filter(|e| e.is_file).count(), 2);

        let mut buf = String::new();
        store
            .download("/wy20/logger/c.xls")
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "c");
    }

    #[test]
    fn missing_paths_are_remote_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert_eq!(
            store.list_folder("/nope", true).unwrap_err().kind(),
            ErrorKind::RemoteUnavailable
        );
        assert_eq!(
            store.download("/nope.csv").err().unwrap().kind(),
            ErrorKind::RemoteUnavailable
        );
    }
}
