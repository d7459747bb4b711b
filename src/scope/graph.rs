//! Scope tree data structure for name binding
//!
//! The scope tree tracks:
//! - Scope hierarchy (parent links, one root per module)
//! - Names declared directly in each scope, in declaration order
//! - The declaration handles bound under each name

use std::collections::HashMap;

use serde::Serialize;

use super::binding::DeclId;

/// Unique identifier for a scope within one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The module scope
    pub fn root() -> Self {
        Self(0)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Module level scope
    Module,
    /// Function body, arrow function or method
    Function,
    /// Brace-delimited block, loop head, catch clause, switch body or
    /// class expression
    Block,
}

impl ScopeKind {
    /// Block scopes do not capture `var` and function declarations
    pub fn is_block(self) -> bool {
        matches!(self, ScopeKind::Block)
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    /// Duplicates are kept: `var x; var x;` declares `x` twice
    declared_names: Vec<String>,
    bindings: HashMap<String, Vec<DeclId>>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            declared_names: Vec::new(),
            bindings: HashMap::new(),
        }
    }
}

/// Scope tree for one module
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a new scope tree with a root module scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, ScopeKind::Module)],
        }
    }

    /// Create a new child scope
    pub fn add_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(parent), kind));
        id
    }

    /// Get the parent of a scope
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Get the kind of a scope
    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.index()].kind
    }

    /// Number of scopes, root included
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Register `decl` under `name`.
    ///
    /// Block declarations (`let`, `const`, `class`, `import`) land in
    /// `scope` itself. Other declarations (`var`, functions) walk up
    /// through block scopes to the nearest function or module scope.
    /// Returns the scope that received the binding.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        decl: DeclId,
        name: &str,
        is_block_declaration: bool,
    ) -> ScopeId {
        let mut target = scope;
        if !is_block_declaration {
            while self.kind(target).is_block() {
                match self.parent(target) {
                    Some(parent) => target = parent,
                    None => break,
                }
            }
        }

        let entry = &mut self.scopes[target.index()];
        entry.declared_names.push(name.to_string());
        entry.bindings.entry(name.to_string()).or_default().push(decl);
        target
    }

    /// Nearest scope, `scope` itself included, that declares `name`
    pub fn find_defining_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if self.scopes[s.index()].bindings.contains_key(name) {
                return Some(s);
            }
            current = self.parent(s);
        }
        None
    }

    /// Whether `name` is declared anywhere on the scope chain
    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.find_defining_scope(scope, name).is_some()
    }

    /// Names declared directly in a scope
    pub fn declared_names(&self, scope: ScopeId) -> &[String] {
        &self.scopes[scope.index()].declared_names
    }

    /// Declaration handles bound to `name` directly in `scope`
    pub fn bindings(&self, scope: ScopeId, name: &str) -> &[DeclId] {
        self.scopes[scope.index()]
            .bindings
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

}
