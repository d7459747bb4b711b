//! Import specifier resolution
//!
//! Relative specifiers resolve against the importer's directory with the
//! module source extension appended. There is no extension probing, no
//! directory index fallback and no `node_modules` lookup: bare
//! specifiers are external and resolve to nothing.

use std::path::{Component, Path, PathBuf};

use crate::Result;

/// Default module source extension
pub const DEFAULT_EXTENSION: &str = ".js";

/// Resolves import sources to absolute module paths
#[derive(Debug, Clone)]
pub struct Resolver {
    extension: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl Resolver {
    pub fn new(extension: impl Into<String>) -> Self {
        let mut extension = extension.into();
        if !extension.is_empty() && !extension.starts_with('.') {
            extension.insert(0, '.');
        }
        Self { extension }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolve `specifier` as written in the module at `importer`.
    ///
    /// Returns `None` for bare specifiers.
    pub fn resolve(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        if !is_path_specifier(specifier) {
            return None;
        }

        let mut file = specifier.to_string();
        if !file.ends_with(&self.extension) {
            file.push_str(&self.extension);
        }

        let base = importer.parent().unwrap_or_else(|| Path::new("/"));
        Some(normalize(&base.join(file)))
    }

    /// Make the entry path absolute and canonical in form
    pub fn resolve_entry(&self, entry: &Path) -> Result<PathBuf> {
        let absolute = std::path::absolute(entry)?;
        Ok(normalize(&absolute))
    }
}

/// `./x`, `../x` and `/x` name files; everything else is a package
pub fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || specifier == "."
        || specifier == ".."
}

/// Fold `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    if !out.has_root() {
                        out.push("..");
                    }
                } else {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
