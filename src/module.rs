//! Analyzed modules and their import / export records

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scope::{DeclId, Declaration, ScopeTree};
use crate::syntax::{self, Splice, SyntaxTree};

/// One binding brought in by an import (or re-export) declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpecifier {
    /// Name exported by the dependency: `default`, `*` or a named export
    pub imported: String,
    /// Local name, `None` for re-exports which bind nothing locally
    pub local: Option<String>,
    /// Declaration handle of the local binding
    #[serde(skip)]
    pub decl: Option<DeclId>,
    /// Line number of the specifier (1-indexed)
    pub line: u32,
}

/// Specifiers imported from one resolved dependency
#[derive(Debug, Clone, Serialize)]
pub struct ImportEntry {
    pub path: PathBuf,
    pub specifiers: Vec<ImportSpecifier>,
}

/// Dependency path -> specifiers, in first-seen order.
///
/// Several declarations importing the same path concatenate their
/// specifiers in statement order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportTable {
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append specifiers under `path`, creating the entry when absent
    pub fn add(&mut self, path: PathBuf, specifiers: impl IntoIterator<Item = ImportSpecifier>) {
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => entry.specifiers.extend(specifiers),
            None => self.entries.push(ImportEntry {
                path,
                specifiers: specifiers.into_iter().collect(),
            }),
        }
    }

    /// Specifiers imported from `path`
    pub fn get(&self, path: &Path) -> Option<&[ImportSpecifier]> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.specifiers.as_slice())
    }

    /// Distinct dependency paths in first-seen order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One name a module exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSpecifier {
    /// Local binding exported, `None` for `export *` and default expressions
    pub local: Option<String>,
    /// Name visible to importers
    pub exported: String,
    /// Source of a re-export, as written
    pub source: Option<String>,
}

/// A module after binding, marking and pruning
#[derive(Debug)]
pub struct AnalyzedModule {
    pub path: PathBuf,
    /// blake3 hash of the source text
    pub hash: blake3::Hash,
    pub tree: SyntaxTree,
    pub scopes: ScopeTree,
    pub declarations: Vec<Declaration>,
    pub imports: ImportTable,
    pub exports: Vec<ExportSpecifier>,
    /// Cuts the pruner made
    pub removals: Vec<Splice>,
    /// Declarations removed, in source order
    pub removed: Vec<DeclId>,
}

impl AnalyzedModule {
    pub fn source(&self) -> &str {
        self.tree.source()
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }

    /// Whether an import specifier's local binding is referenced.
    /// Re-export specifiers count as live.
    pub fn is_live(&self, specifier: &ImportSpecifier) -> bool {
        specifier
            .decl
            .map(|id| self.declaration(id).live)
            .unwrap_or(true)
    }

    /// Removed declarations in source order
    pub fn removed_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.removed.iter().map(|id| self.declaration(*id))
    }

    /// Pruned, regenerated source text
    pub fn output(&self) -> String {
        syntax::print(self.source(), &self.removals)
    }
}
