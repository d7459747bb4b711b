//! Module analysis - bind, mark, prune
//!
//! Each module is analysed in three passes over its syntax tree:
//! 1. `Binder` builds the scope tree and registers every declaration
//! 2. `Marker` resolves identifier references and computes liveness
//! 3. `Pruner` turns dead declarations into deleted byte ranges
//!
//! The first two passes only annotate. Structural removal happens in
//! the pruner once liveness is final.

pub mod binder;
pub mod marker;
pub mod pruner;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::Result;
use crate::module::AnalyzedModule;
use crate::resolve::Resolver;
use crate::scope::{DeclId, ScopeId};
use crate::syntax::JsParser;

pub use binder::{Binder, Bound};
pub use marker::{Marker, Reference};
pub use pruner::{Pruned, Pruner};

/// Out-of-band node annotations, keyed by tree-sitter node id
#[derive(Debug, Default)]
pub struct Annotations {
    /// Scope opened at a scope-boundary node
    pub scopes: HashMap<usize, ScopeId>,
    /// Identifier nodes that are binding occurrences, not uses
    pub non_references: HashSet<usize>,
    /// Declaration handle owned by a declaring node
    pub declarations: HashMap<usize, DeclId>,
}

/// Run all three passes over one module's source text
pub fn analyze(
    parser: &mut JsParser,
    resolver: &Resolver,
    path: &Path,
    source: String,
) -> Result<AnalyzedModule> {
    let hash = blake3::hash(source.as_bytes());
    let tree = parser.parse(path, source)?;

    let Bound {
        scopes,
        mut declarations,
        annotations,
        imports,
        exports,
    } = Binder::new(&tree, path, resolver).bind();

    let references = Marker::new(&tree, &scopes, &annotations, &declarations).mark();
    marker::propagate(&mut declarations, &references);

    let Pruned { removals, removed } = Pruner::new(&tree, &annotations, &declarations).prune();

    tracing::debug!(
        path = %path.display(),
        declarations = declarations.len(),
        references = references.len(),
        removed = removed.len(),
        "analyzed module"
    );

    Ok(AnalyzedModule {
        path: path.to_path_buf(),
        hash,
        tree,
        scopes,
        declarations,
        imports,
        exports,
        removals,
        removed,
    })
}

/// Shake a single standalone module and return the pruned text
pub fn shake_source(source: &str) -> Result<String> {
    let mut parser = JsParser::new()?;
    let module = analyze(
        &mut parser,
        &Resolver::default(),
        Path::new("/module.js"),
        source.to_string(),
    )?;
    Ok(module.output())
}
