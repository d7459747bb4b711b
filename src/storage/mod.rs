//! Storage Layer - module text in, pruned text out
//!
//! The analysis never touches the filesystem directly. Module text is
//! read and regenerated text written through a `ModuleStore`:
//! - `FsStore` for real files on disk
//! - `MemoryStore` for tests and embedding callers

pub mod fs;
pub mod memory;

use std::path::Path;

use crate::Result;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Source of module text and sink for regenerated modules
pub trait ModuleStore: Send + Sync {
    /// Read the full text of the module at `path`.
    ///
    /// A missing or unreadable module is `Error::ModuleNotFound`.
    fn read_module(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path`, creating parent directories and
    /// replacing any existing file. Returns whether a file was already
    /// there and whether its contents differed.
    fn write_module(&self, path: &Path, contents: &str) -> Result<crate::FileStatus>;
}
