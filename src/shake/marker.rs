//! Resolver/Marker - second pass
//!
//! Re-walks the tree entering the scopes the binder attached, resolves
//! every identifier that is not a binding occurrence to the nearest
//! scope declaring its name, and records which declarations the use
//! reaches. Names with no defining scope are globals and are ignored.
//!
//! Liveness is then propagated from the roots: uses outside any
//! removable declaration, plus exported declarations. A use inside a
//! removable declaration only counts once that declaration is live, so
//! code reachable only from dead code is dead too.

use std::collections::HashMap;

use tree_sitter::Node;

use super::Annotations;
use crate::scope::{DeclId, Declaration, ScopeId, ScopeTree};
use crate::syntax::{self, NodeKind, SyntaxTree};

/// One resolved identifier use
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub node_id: usize,
    /// Scope the use occurs in
    pub scope: ScopeId,
    /// Innermost removable declaration containing the use
    pub owner: Option<DeclId>,
    /// Every declaration bound to the name in its defining scope
    pub targets: Vec<DeclId>,
}

pub struct Marker<'a> {
    tree: &'a SyntaxTree,
    scopes: &'a ScopeTree,
    annotations: &'a Annotations,
    declarations: &'a [Declaration],
    references: Vec<Reference>,
}

impl<'a> Marker<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        scopes: &'a ScopeTree,
        annotations: &'a Annotations,
        declarations: &'a [Declaration],
    ) -> Self {
        Self {
            tree,
            scopes,
            annotations,
            declarations,
            references: Vec::new(),
        }
    }

    /// Resolve all references. Unresolved (global) uses are dropped.
    pub fn mark(mut self) -> Vec<Reference> {
        let root = self.tree.root();
        self.visit(root, ScopeId::root(), None);
        self.references
    }

    fn visit(&mut self, node: Node<'a>, scope: ScopeId, owner: Option<DeclId>) {
        let scope = self
            .annotations
            .scopes
            .get(&node.id())
            .copied()
            .unwrap_or(scope);
        let owner = match self.annotations.declarations.get(&node.id()) {
            Some(&id) if self.declarations[id.index()].removable => Some(id),
            _ => owner,
        };

        match NodeKind::of(node) {
            // obj.prop: `prop` is a property name, never a variable
            NodeKind::MemberAccess => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object, scope, owner);
                }
                return;
            }
            NodeKind::Identifier if !self.annotations.non_references.contains(&node.id()) => {
                self.resolve(node, scope, owner);
            }
            _ => {}
        }

        for child in syntax::children(node) {
            self.visit(child, scope, owner);
        }
    }

    fn resolve(&mut self, node: Node<'a>, scope: ScopeId, owner: Option<DeclId>) {
        let name = self.tree.text(node);
        let Some(defining) = self.scopes.find_defining_scope(scope, name) else {
            return;
        };
        self.references.push(Reference {
            name: name.to_string(),
            node_id: node.id(),
            scope,
            owner,
            targets: self.scopes.bindings(defining, name).to_vec(),
        });
    }
}

/// Compute liveness from resolved references.
///
/// Sets `live` on every declaration reachable from a root and counts
/// the live references reaching each one. Returns the number of live
/// declarations.
pub fn propagate(declarations: &mut [Declaration], references: &[Reference]) -> usize {
    let mut owned: HashMap<DeclId, Vec<usize>> = HashMap::new();
    let mut pending: Vec<usize> = Vec::new();
    for (index, reference) in references.iter().enumerate() {
        match reference.owner {
            Some(owner) => owned.entry(owner).or_default().push(index),
            None => pending.push(index),
        }
    }

    let mut newly_live: Vec<DeclId> = Vec::new();
    for decl in declarations.iter_mut() {
        if decl.exported && !decl.live {
            decl.live = true;
            newly_live.push(decl.id);
        }
    }

    loop {
        while let Some(index) = pending.pop() {
            for &target in &references[index].targets {
                let decl = &mut declarations[target.index()];
                decl.references += 1;
                if !decl.live {
                    decl.live = true;
                    newly_live.push(target);
                }
            }
        }
        match newly_live.pop() {
            Some(id) => {
                if let Some(uses) = owned.remove(&id) {
                    pending.extend(uses);
                }
            }
            None => break,
        }
    }

    declarations.iter().filter(|d| d.live).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use crate::shake::{Binder, Bound};
    use crate::syntax::JsParser;
    use std::path::Path;

    fn mark(source: &str) -> (Vec<Declaration>, Vec<Reference>) {
        let tree = JsParser::new()
            .unwrap()
            .parse(Path::new("/m.js"), source.to_string())
            .unwrap();
        let resolver = Resolver::default();
        let Bound {
            scopes,
            mut declarations,
            annotations,
            ..
        } = Binder::new(&tree, Path::new("/m.js"), &resolver).bind();
        let references = Marker::new(&tree, &scopes, &annotations, &declarations).mark();
        propagate(&mut declarations, &references);
        (declarations, references)
    }

    fn live_names(declarations: &[Declaration]) -> Vec<String> {
        declarations
            .iter()
            .filter(|d| d.live)
            .map(Declaration::display_name)
            .collect()
    }

    #[test]
    fn test_globals_are_not_recorded() {
        let (_, references) = mark("console.log(document.title);");
        assert!(references.is_empty());
    }

    #[test]
    fn test_member_property_skipped() {
        let (declarations, references) = mark("const prop = 1; const o = {}; o.prop;");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].name, "o");
        assert_eq!(live_names(&declarations), ["o"]);
    }

    #[test]
    fn test_nearest_scope_wins() {
        let (declarations, references) = mark("let x = 1; { let x = 2; x; }");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].targets, [DeclId(1)]);
        assert!(!declarations[0].live);
        assert!(declarations[1].live);
    }

    #[test]
    fn test_codeclared_targets() {
        let (declarations, references) = mark("var x = 1; var x = 2; x;");
        assert_eq!(references[0].targets, [DeclId(0), DeclId(1)]);
        assert_eq!(declarations[0].references, 1);
        assert_eq!(declarations[1].references, 1);
    }

    #[test]
    fn test_owner_tracking() {
        let (declarations, references) = mark("function a() { b(); } function b() {} a();");
        let inner = references.iter().find(|r| r.name == "b").unwrap();
        assert_eq!(inner.owner, Some(DeclId(0)));
        let outer = references.iter().find(|r| r.name == "a").unwrap();
        assert_eq!(outer.owner, None);
        assert_eq!(live_names(&declarations), ["a", "b"]);
    }

    #[test]
    fn test_dead_owner_does_not_mark() {
        let (declarations, _) = mark("function a() { b(); } function b() {}");
        assert!(live_names(&declarations).is_empty());
    }

    #[test]
    fn test_exports_are_roots() {
        let (declarations, _) = mark("function helper() {} export function api() { helper(); }");
        assert_eq!(live_names(&declarations), ["helper", "api"]);
    }

    #[test]
    fn test_propagate_counts_live() {
        let (mut declarations, references) = mark("const a = 1; const b = a; b;");
        for decl in declarations.iter_mut() {
            decl.live = false;
            decl.references = 0;
        }
        assert_eq!(propagate(&mut declarations, &references), 2);
    }
}
