//! Filesystem-backed module store

use std::fs;
use std::path::Path;

use crate::{Error, FileStatus, Result};

use super::ModuleStore;

/// Reads and writes modules on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleStore for FsStore {
    fn read_module(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| Error::ModuleNotFound {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_module(&self, path: &Path, contents: &str) -> Result<FileStatus> {
        let write_err = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };

        let status = match fs::read_to_string(path) {
            Ok(existing) if existing == contents => FileStatus::Unchanged,
            Ok(_) => FileStatus::Modified,
            Err(_) => FileStatus::New,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, contents).map_err(write_err)?;
        Ok(status)
    }
}
