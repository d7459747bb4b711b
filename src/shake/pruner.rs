//! Pruner - third pass
//!
//! Turns dead declarations into byte ranges to delete. Whole statements
//! go when every binding they introduce is dead; comma lists (declarator
//! lists, import clauses, named imports) lose only their dead items,
//! separators included. Removed subtrees are not visited further.
//!
//! Deleting a statement never lets its neighbours run together: when the
//! statement before it has no terminator and the one after it opens with
//! a token that would continue an expression, a `;` is left in its place.

use std::collections::HashSet;

use tree_sitter::Node;

use super::Annotations;
use crate::scope::{DeclId, Declaration};
use crate::syntax::printer::statement_span;
use crate::syntax::{self, NodeKind, Splice, SyntaxTree};

/// Removal plan for one module
#[derive(Debug, Default)]
pub struct Pruned {
    pub removals: Vec<Splice>,
    /// Removed declarations, in source order
    pub removed: Vec<DeclId>,
}

pub struct Pruner<'a> {
    tree: &'a SyntaxTree,
    annotations: &'a Annotations,
    declarations: &'a [Declaration],
    /// Statements already cut, by node id
    cut: HashSet<usize>,
    out: Pruned,
}

impl<'a> Pruner<'a> {
    pub fn new(tree: &'a SyntaxTree, annotations: &'a Annotations, declarations: &'a [Declaration]) -> Self {
        Self {
            tree,
            annotations,
            declarations,
            cut: HashSet::new(),
            out: Pruned::default(),
        }
    }

    pub fn prune(mut self) -> Pruned {
        let root = self.tree.root();
        self.visit(root);

        let declarations = self.declarations;
        self.out
            .removed
            .sort_by_key(|id| declarations[id.index()].range.start);
        self.out
    }

    fn visit(&mut self, node: Node<'a>) {
        match NodeKind::of(node) {
            NodeKind::FunctionDeclaration | NodeKind::ClassDeclaration => {
                if let Some(id) = self.dead(node) {
                    self.remove_statement(node);
                    self.out.removed.push(id);
                    return;
                }
            }
            NodeKind::VarDeclaration | NodeKind::LexicalDeclaration => {
                self.prune_variables(node);
                return;
            }
            NodeKind::ImportDeclaration => {
                self.prune_import(node);
                return;
            }
            _ => {}
        }

        for child in syntax::children(node) {
            self.visit(child);
        }
    }

    /// The declaration a node owns, if it is dead
    fn dead(&self, node: Node<'a>) -> Option<DeclId> {
        let id = *self.annotations.declarations.get(&node.id())?;
        self.declarations[id.index()].is_dead().then_some(id)
    }

    fn remove_statement(&mut self, node: Node<'a>) {
        let target = match node.parent() {
            Some(parent) if parent.kind() == "export_statement" => parent,
            _ => node,
        };
        let span = statement_span(self.tree.source(), target.byte_range());
        let splice = if self.joins_neighbours(target) {
            Splice::replace(span, ";")
        } else {
            Splice::delete(span)
        };
        self.cut.insert(target.id());
        self.out.removals.push(splice);
    }

    /// Whether deleting `target` outright would merge the statements
    /// around it into one
    fn joins_neighbours(&self, target: Node<'a>) -> bool {
        let mut prev = target.prev_named_sibling();
        while let Some(node) = prev.filter(|n| n.kind() == "comment" || self.cut.contains(&n.id())) {
            prev = node.prev_named_sibling();
        }
        let mut next = target.next_named_sibling();
        while let Some(node) = next.filter(|n| n.kind() == "comment") {
            next = node.next_named_sibling();
        }

        match (prev, next) {
            (Some(prev), Some(next)) => {
                !is_terminated(self.tree, prev) && continues_expression(self.tree.text(next))
            }
            _ => false,
        }
    }

    /// Delete each maximal run of dead items from a comma list. A run
    /// followed by a kept item takes the separator after it, a trailing
    /// run takes the separator before it.
    fn remove_runs(&mut self, items: &[Node<'a>], dead: &[bool]) {
        let mut i = 0;
        while i < items.len() {
            if !dead[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < items.len() && dead[i] {
                i += 1;
            }
            if i < items.len() {
                self.out
                    .removals
                    .push(Splice::delete(items[start].start_byte()..items[i].start_byte()));
            } else if start > 0 {
                self.out
                    .removals
                    .push(Splice::delete(items[start - 1].end_byte()..items[i - 1].end_byte()));
            }
        }
    }

    fn prune_variables(&mut self, node: Node<'a>) {
        let declarators: Vec<Node<'a>> = syntax::named_children(node)
            .into_iter()
            .filter(|d| d.kind() == "variable_declarator")
            .collect();
        let dead: Vec<Option<DeclId>> = declarators.iter().map(|d| self.dead(*d)).collect();

        if !declarators.is_empty() && dead.iter().all(Option::is_some) {
            self.remove_statement(node);
            self.out.removed.extend(dead.into_iter().flatten());
            return;
        }

        let flags: Vec<bool> = dead.iter().map(Option::is_some).collect();
        self.remove_runs(&declarators, &flags);
        self.out.removed.extend(dead.iter().flatten().copied());

        for (declarator, dead) in declarators.into_iter().zip(flags) {
            if !dead {
                self.visit(declarator);
            }
        }
    }

    fn prune_import(&mut self, node: Node<'a>) {
        // Side-effect imports bind nothing and always stay
        let Some(clause) = syntax::named_children(node)
            .into_iter()
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        let items = syntax::named_children(clause);
        let mut flags = Vec::with_capacity(items.len());
        let mut groups = Vec::new();
        let mut removed = Vec::new();

        for item in &items {
            if item.kind() == "named_imports" {
                let specs: Vec<Node<'a>> = syntax::named_children(*item)
                    .into_iter()
                    .filter(|s| s.kind() == "import_specifier")
                    .collect();
                let dead: Vec<Option<DeclId>> = specs.iter().map(|s| self.dead(*s)).collect();
                let all_dead = !specs.is_empty() && dead.iter().all(Option::is_some);
                removed.extend(dead.iter().flatten().copied());
                flags.push(all_dead);
                if !all_dead {
                    groups.push((specs, dead.iter().map(Option::is_some).collect::<Vec<_>>()));
                }
            } else {
                let dead = self.dead(*item);
                removed.extend(dead);
                flags.push(dead.is_some());
            }
        }

        if !items.is_empty() && flags.iter().all(|dead| *dead) {
            self.remove_statement(node);
        } else {
            self.remove_runs(&items, &flags);
            for (specs, dead) in groups {
                self.remove_runs(&specs, &dead);
            }
        }
        self.out.removed.extend(removed);
    }
}

/// A statement that cannot be extended by whatever follows it
fn is_terminated(tree: &SyntaxTree, node: Node<'_>) -> bool {
    if tree.text(node).trim_end().ends_with(';') {
        return true;
    }
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "class_declaration"
        | "statement_block" | "import_statement" => true,
        "export_statement" => node
            .child_by_field_name("declaration")
            .is_some_and(|decl| is_terminated(tree, decl)),
        _ => false,
    }
}

/// First tokens that glue onto an unterminated expression before them
fn continues_expression(text: &str) -> bool {
    matches!(
        text.as_bytes().first(),
        Some(b'(' | b'[' | b'`' | b'+' | b'-' | b'/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use crate::shake::marker::{self, Marker};
    use crate::shake::{Binder, Bound};
    use crate::syntax::JsParser;
    use std::path::Path;

    fn prune(source: &str) -> (String, Vec<String>) {
        let tree = JsParser::new()
            .unwrap()
            .parse(Path::new("/p.js"), source.to_string())
            .unwrap();
        let resolver = Resolver::default();
        let Bound {
            scopes,
            mut declarations,
            annotations,
            ..
        } = Binder::new(&tree, Path::new("/p.js"), &resolver).bind();
        let references = Marker::new(&tree, &scopes, &annotations, &declarations).mark();
        marker::propagate(&mut declarations, &references);
        let Pruned { removals, removed } = Pruner::new(&tree, &annotations, &declarations).prune();

        let names = removed
            .iter()
            .map(|id| declarations[id.index()].display_name())
            .collect();
        (syntax::print(tree.source(), &removals), names)
    }

    #[test]
    fn test_nothing_dead_nothing_removed() {
        let (out, removed) = prune("const a = 1;\nexport { a };\n");
        assert_eq!(out, "const a = 1;\nexport { a };\n");
        assert!(removed.is_empty());
    }

    #[test]
    fn test_middle_declarator() {
        let (out, removed) = prune("var a = 1, b = 2, c = 3;\nf(a, c);\n");
        assert_eq!(out, "var a = 1, c = 3;\nf(a, c);\n");
        assert_eq!(removed, ["b"]);
    }

    #[test]
    fn test_leading_run_of_declarators() {
        let (out, removed) = prune("const a = 1, b = 2, c = 3;\nf(c);\n");
        assert_eq!(out, "const c = 3;\nf(c);\n");
        assert_eq!(removed, ["a", "b"]);
    }

    #[test]
    fn test_kept_declarator_is_descended() {
        let (out, removed) = prune("const keep = () => { const inner = 1; return 2; };\nkeep();\n");
        assert_eq!(out, "const keep = () => { return 2; };\nkeep();\n");
        assert_eq!(removed, ["inner"]);
    }

    #[test]
    fn test_removed_function_is_not_descended() {
        let (out, removed) = prune("function outer() {\n  function inner() {}\n}\n");
        assert_eq!(out, "");
        assert_eq!(removed, ["outer"]);
    }

    #[test]
    fn test_indented_statement_takes_its_line() {
        let (out, _) = prune("function f() {\n  let unused = 1;\n  return 2;\n}\nf();\n");
        assert_eq!(out, "function f() {\n  return 2;\n}\nf();\n");
    }

    #[test]
    fn test_default_import_dropped_named_kept() {
        let (out, removed) = prune("import d, { a } from './m.js';\na();\n");
        assert_eq!(out, "import { a } from './m.js';\na();\n");
        assert_eq!(removed, ["d"]);
    }

    #[test]
    fn test_named_group_dropped_default_kept() {
        let (out, removed) = prune("import d, { a, b } from './m.js';\nd();\n");
        assert_eq!(out, "import d from './m.js';\nd();\n");
        assert_eq!(removed, ["a", "b"]);
    }

    #[test]
    fn test_aliased_import_specifier() {
        let (out, _) = prune("import { a as x, b as y } from './m.js';\ny();\n");
        assert_eq!(out, "import { b as y } from './m.js';\ny();\n");
    }

    #[test]
    fn test_side_effect_import_kept() {
        let (out, removed) = prune("import './polyfill.js';\n");
        assert_eq!(out, "import './polyfill.js';\n");
        assert!(removed.is_empty());
    }

    #[test]
    fn test_unterminated_neighbours_keep_a_separator() {
        let (out, removed) = prune("run()\nfunction unused() {}\n[1, 2].forEach(log)\n");
        assert_eq!(out, "run()\n;[1, 2].forEach(log)\n");
        assert_eq!(removed, ["unused"]);
    }

    #[test]
    fn test_separator_looks_past_earlier_cuts() {
        let (out, _) = prune("run()\nlet a = 1\n// note\nfunction b() {}\n(go)()\n");
        assert_eq!(out, "run()\n// note\n;(go)()\n");
    }

    #[test]
    fn test_no_separator_when_safe() {
        let (out, _) = prune("run();\nfunction unused() {}\n[1].forEach(log)\n");
        assert_eq!(out, "run();\n[1].forEach(log)\n");

        let (out, _) = prune("run()\nfunction unused() {}\nnext()\n");
        assert_eq!(out, "run()\nnext()\n");
    }

    #[test]
    fn test_removed_in_source_order() {
        let (_, removed) = prune("import { z } from './z.js';\nfunction y() {}\nlet x = 1;\n");
        assert_eq!(removed, ["z", "y", "x"]);
    }
}
