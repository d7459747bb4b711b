//! In-memory module store

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::{Error, FileStatus, Result};

use super::ModuleStore;

/// Module texts held in a map, keyed by absolute path
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, text)` pairs
    pub fn with_modules<P, S>(modules: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let files = modules
            .into_iter()
            .map(|(path, text)| (path.into(), text.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), text.into());
        }
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned(path: &Path) -> io::Error {
    io::Error::other(format!("store lock poisoned reading {}", path.display()))
}

impl ModuleStore for MemoryStore {
    fn read_module(&self, path: &Path) -> Result<String> {
        let files = self.files.read().map_err(|_| Error::ModuleNotFound {
            path: path.to_path_buf(),
            source: poisoned(path),
        })?;
        files.get(path).cloned().ok_or_else(|| Error::ModuleNotFound {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn write_module(&self, path: &Path, contents: &str) -> Result<FileStatus> {
        let mut files = self.files.write().map_err(|_| Error::Write {
            path: path.to_path_buf(),
            source: poisoned(path),
        })?;
        let status = match files.insert(path.to_path_buf(), contents.to_string()) {
            None => FileStatus::New,
            Some(previous) if previous == contents => FileStatus::Unchanged,
            Some(_) => FileStatus::Modified,
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::with_modules([("/a.js", "let a;")]);
        assert_eq!(store.read_module(Path::new("/a.js")).unwrap(), "let a;");
        assert_eq!(
            store.write_module(Path::new("/out/a.js"), "").unwrap(),
            FileStatus::New
        );
        assert_eq!(store.paths(), [PathBuf::from("/a.js"), PathBuf::from("/out/a.js")]);
    }

    #[test]
    fn test_missing_module() {
        let store = MemoryStore::new();
        let err = store.read_module(Path::new("/missing.js")).unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }
}
