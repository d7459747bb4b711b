//! # Treeshake - Scope-aware dead binding elimination for ES modules
//!
//! Starting from an entry module, treeshake discovers the import graph,
//! models the lexical scopes of every module and removes the declarations
//! that nothing references.
//!
//! Treeshake provides:
//! - Tree-sitter based parsing of JavaScript modules
//! - A lexical scope model with `var`/function hoisting
//! - A three pass analysis per module: bind, mark, prune
//! - A cycle-safe module graph with a content-hash cache
//! - Regeneration of pruned sources next to the originals

pub mod config;
pub mod graph;
pub mod module;
pub mod output;
pub mod report;
pub mod resolve;
pub mod scope;
pub mod shake;
pub mod storage;
pub mod syntax;
pub mod ui;
pub mod writer;

use std::path::PathBuf;

// Re-exports for convenient access
pub use graph::{GraphBuilder, ModuleCache, ModuleGraph, ModuleId};
pub use module::{AnalyzedModule, ExportSpecifier, ImportSpecifier, ImportTable};
pub use scope::{DeclId, DeclKind, Declaration, ScopeId, ScopeKind, ScopeTree};
pub use shake::shake_source;
pub use storage::{FsStore, MemoryStore, ModuleStore};
pub use writer::{EmitOptions, EmitReport, emit_graph};

/// Result type alias for treeshake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for treeshake operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Module not found: {}", path.display())]
    ModuleNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}:{line}:{column}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Circular import: {}", format_cycle(cycle))]
    CircularImport { cycle: Vec<PathBuf> },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Language error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The module path the error is about, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::ModuleNotFound { path, .. }
            | Error::Parse { path, .. }
            | Error::Write { path, .. } => Some(path),
            Error::CircularImport { cycle } => cycle.last().map(PathBuf::as_path),
            Error::Language(_) | Error::Io(_) => None,
        }
    }
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Status of an emitted module relative to what was on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    New,
    Modified,
    Unchanged,
}
