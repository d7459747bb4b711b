//! Binder - first pass
//!
//! Walks the tree depth-first with the current scope threaded through
//! the recursion. Scope-boundary nodes get a fresh child scope; every
//! declaration site is registered into the scope its hoisting class
//! selects and its binding identifiers are flagged as non-references.
//! Import and export declarations also feed the module's import table
//! and export list.

use std::path::Path;

use tree_sitter::Node;

use super::Annotations;
use crate::module::{ExportSpecifier, ImportSpecifier, ImportTable};
use crate::resolve::Resolver;
use crate::scope::{DeclId, DeclKind, Declaration, ScopeId, ScopeTree};
use crate::syntax::{self, NodeKind, SyntaxTree};

/// Everything the binder produces for one module
#[derive(Debug, Default)]
pub struct Bound {
    pub scopes: ScopeTree,
    pub declarations: Vec<Declaration>,
    pub annotations: Annotations,
    pub imports: ImportTable,
    pub exports: Vec<ExportSpecifier>,
}

pub struct Binder<'a> {
    tree: &'a SyntaxTree,
    path: &'a Path,
    resolver: &'a Resolver,
    out: Bound,
}

impl<'a> Binder<'a> {
    pub fn new(tree: &'a SyntaxTree, path: &'a Path, resolver: &'a Resolver) -> Self {
        Self {
            tree,
            path,
            resolver,
            out: Bound::default(),
        }
    }

    pub fn bind(mut self) -> Bound {
        let root = self.tree.root();
        self.visit(root, ScopeId::root());
        self.out
    }

    fn visit(&mut self, node: Node<'a>, scope: ScopeId) {
        let kind = NodeKind::of(node);

        // Declarations that bind in the enclosing scope
        match kind {
            NodeKind::FunctionDeclaration => self.declare_function(node, scope),
            NodeKind::VarDeclaration | NodeKind::LexicalDeclaration => {
                self.declare_variables(node, kind, scope)
            }
            NodeKind::ClassDeclaration => self.declare_class(node, scope),
            NodeKind::ImportDeclaration => self.declare_imports(node, scope),
            NodeKind::ExportDeclaration => self.collect_exports(node),
            _ => {}
        }

        let inner = match kind.scope_kind() {
            Some(scope_kind) => {
                let child = self.out.scopes.add_scope(scope, scope_kind);
                self.out.annotations.scopes.insert(node.id(), child);
                child
            }
            None => scope,
        };

        // Declarations that bind inside the scope this node opened
        match kind {
            NodeKind::FunctionExpression => {
                if let Some(name) = node.child_by_field_name("name") {
                    let text = self.text(name);
                    self.out.annotations.non_references.insert(name.id());
                    self.declare(name, DeclKind::FunctionName, vec![text], inner, false, false);
                }
                self.declare_params(node, inner);
            }
            NodeKind::ClassExpression => {
                if let Some(name) = node.child_by_field_name("name") {
                    let text = self.text(name);
                    self.out.annotations.non_references.insert(name.id());
                    self.declare(name, DeclKind::ClassName, vec![text], inner, false, false);
                }
            }
            NodeKind::FunctionDeclaration | NodeKind::ArrowFunction | NodeKind::Method => {
                self.declare_params(node, inner)
            }
            NodeKind::ForInLoop => self.declare_loop_binding(node, inner),
            NodeKind::CatchClause => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    let names = self.binding_names(param);
                    self.declare(param, DeclKind::Catch, names, inner, false, false);
                }
            }
            _ => {}
        }

        for child in syntax::children(node) {
            self.visit(child, inner);
        }
    }

    fn text(&self, node: Node<'a>) -> String {
        self.tree.text(node).to_string()
    }

    fn declare(
        &mut self,
        node: Node<'a>,
        kind: DeclKind,
        names: Vec<String>,
        scope: ScopeId,
        removable: bool,
        exported: bool,
    ) -> DeclId {
        let id = DeclId(self.out.declarations.len() as u32);
        let mut landed = scope;
        for name in &names {
            landed = self
                .out
                .scopes
                .declare(scope, id, name, kind.is_block_declaration());
        }

        if exported {
            let default_export = node
                .parent()
                .is_some_and(|p| syntax::children(p).iter().any(|c| c.kind() == "default"));
            for name in &names {
                self.out.exports.push(ExportSpecifier {
                    local: Some(name.clone()),
                    exported: if default_export { "default".to_string() } else { name.clone() },
                    source: None,
                });
            }
        }

        self.out.annotations.declarations.insert(node.id(), id);
        self.out.declarations.push(Declaration {
            id,
            kind,
            names,
            node_id: node.id(),
            range: node.byte_range(),
            line: node.start_position().row as u32 + 1,
            scope: landed,
            removable,
            exported,
            live: false,
            references: 0,
        });
        id
    }

    /// Collect the names a binding pattern introduces, flagging each
    /// binding identifier as a non-reference. Default values and
    /// computed keys stay references.
    fn binding_names(&mut self, pattern: Node<'a>) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bindings(pattern, &mut names);
        names
    }

    fn collect_bindings(&mut self, pattern: Node<'a>, names: &mut Vec<String>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                self.out.annotations.non_references.insert(pattern.id());
                names.push(self.text(pattern));
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in syntax::named_children(pattern) {
                    self.collect_bindings(child, names);
                }
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.collect_bindings(value, names);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.collect_bindings(left, names);
                }
            }
            _ => {}
        }
    }

    fn declare_function(&mut self, node: Node<'a>, scope: ScopeId) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let text = self.text(name);
        self.out.annotations.non_references.insert(name.id());
        self.declare(
            node,
            DeclKind::Function,
            vec![text],
            scope,
            syntax::is_removable_statement(node),
            syntax::is_exported(node),
        );
    }

    fn declare_params(&mut self, node: Node<'a>, scope: ScopeId) {
        // Arrow functions with a single bare parameter
        if let Some(param) = node.child_by_field_name("parameter") {
            let names = self.binding_names(param);
            self.declare(param, DeclKind::Param, names, scope, false, false);
        }

        let Some(params) = node.child_by_field_name("parameters") else {
            return;
        };
        for param in syntax::named_children(params) {
            let names = self.binding_names(param);
            if !names.is_empty() {
                self.declare(param, DeclKind::Param, names, scope, false, false);
            }
        }
    }

    fn declare_variables(&mut self, node: Node<'a>, kind: NodeKind, scope: ScopeId) {
        let decl_kind = match kind {
            NodeKind::VarDeclaration => DeclKind::Var,
            _ => match node.child(0).map(|c| c.kind()) {
                Some("const") => DeclKind::Const,
                _ => DeclKind::Let,
            },
        };
        let removable = syntax::is_removable_statement(node);
        let exported = syntax::is_exported(node);

        for declarator in syntax::named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let names = self.binding_names(name);
            self.declare(declarator, decl_kind, names, scope, removable, exported);
        }
    }

    fn declare_loop_binding(&mut self, node: Node<'a>, scope: ScopeId) {
        // Without a declaration keyword the left side is an assignment target
        let Some(keyword) = node.child_by_field_name("kind") else {
            return;
        };
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let decl_kind = match keyword.kind() {
            "var" => DeclKind::Var,
            "const" => DeclKind::Const,
            _ => DeclKind::Let,
        };
        let names = self.binding_names(left);
        self.declare(left, decl_kind, names, scope, false, false);
    }

    fn declare_class(&mut self, node: Node<'a>, scope: ScopeId) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let text = self.text(name);
        self.out.annotations.non_references.insert(name.id());
        self.declare(
            node,
            DeclKind::Class,
            vec![text],
            scope,
            syntax::is_removable_statement(node),
            syntax::is_exported(node),
        );
    }

    fn declare_imports(&mut self, node: Node<'a>, scope: ScopeId) {
        let removable = syntax::is_removable_statement(node);
        let mut specifiers = Vec::new();

        for clause in syntax::named_children(node) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for item in syntax::named_children(clause) {
                match item.kind() {
                    // import def from "..."
                    "identifier" => {
                        let local = self.text(item);
                        self.out.annotations.non_references.insert(item.id());
                        let decl =
                            self.declare(item, DeclKind::Import, vec![local.clone()], scope, removable, false);
                        specifiers.push(self.import_specifier(item, "default".to_string(), local, decl));
                    }
                    // import * as ns from "..."
                    "namespace_import" => {
                        let Some(ident) = syntax::named_children(item)
                            .into_iter()
                            .find(|c| c.kind() == "identifier")
                        else {
                            continue;
                        };
                        let local = self.text(ident);
                        self.out.annotations.non_references.insert(ident.id());
                        let decl =
                            self.declare(item, DeclKind::Import, vec![local.clone()], scope, removable, false);
                        specifiers.push(self.import_specifier(item, "*".to_string(), local, decl));
                    }
                    // import { a, b as c } from "..."
                    "named_imports" => {
                        for spec in syntax::named_children(item) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let alias = spec.child_by_field_name("alias");
                            let local_node = alias.unwrap_or(name);
                            self.out.annotations.non_references.insert(name.id());
                            self.out.annotations.non_references.insert(local_node.id());

                            let imported = syntax::string_value(self.tree.text(name)).to_string();
                            let local = self.text(local_node);
                            let decl =
                                self.declare(spec, DeclKind::Import, vec![local.clone()], scope, removable, false);
                            specifiers.push(self.import_specifier(spec, imported, local, decl));
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(path) = self.resolve_source(node) {
            self.out.imports.add(path, specifiers);
        }
    }

    fn import_specifier(&self, node: Node<'a>, imported: String, local: String, decl: DeclId) -> ImportSpecifier {
        ImportSpecifier {
            imported,
            local: Some(local),
            decl: Some(decl),
            line: node.start_position().row as u32 + 1,
        }
    }

    /// Resolve the `source` string of an import or re-export
    fn resolve_source(&self, node: Node<'a>) -> Option<std::path::PathBuf> {
        let source = node.child_by_field_name("source")?;
        let specifier = syntax::string_value(self.tree.text(source));
        let resolved = self.resolver.resolve(self.path, specifier);
        if resolved.is_none() {
            tracing::debug!(
                module = %self.path.display(),
                specifier,
                "external import, not followed"
            );
        }
        resolved
    }

    fn collect_exports(&mut self, node: Node<'a>) {
        let source = node
            .child_by_field_name("source")
            .map(|s| syntax::string_value(self.tree.text(s)).to_string());
        let mut reexports = Vec::new();

        // export default <expression>
        if let Some(value) = node.child_by_field_name("value") {
            let local = (value.kind() == "identifier").then(|| self.text(value));
            self.out.exports.push(ExportSpecifier {
                local,
                exported: "default".to_string(),
                source: None,
            });
        }

        for child in syntax::named_children(node) {
            match child.kind() {
                "export_clause" => {
                    for spec in syntax::named_children(child) {
                        if spec.kind() != "export_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let alias = spec.child_by_field_name("alias");
                        if let Some(alias) = alias {
                            self.out.annotations.non_references.insert(alias.id());
                        }
                        let name_text = syntax::string_value(self.tree.text(name)).to_string();
                        let exported = alias
                            .map(|a| syntax::string_value(self.tree.text(a)).to_string())
                            .unwrap_or_else(|| name_text.clone());

                        if source.is_some() {
                            // Re-exported names live in the other module
                            self.out.annotations.non_references.insert(name.id());
                            reexports.push(ImportSpecifier {
                                imported: name_text,
                                local: None,
                                decl: None,
                                line: spec.start_position().row as u32 + 1,
                            });
                            self.out.exports.push(ExportSpecifier {
                                local: None,
                                exported,
                                source: source.clone(),
                            });
                        } else {
                            self.out.exports.push(ExportSpecifier {
                                local: Some(name_text),
                                exported,
                                source: None,
                            });
                        }
                    }
                }
                // export * as ns from "..."
                "namespace_export" => {
                    let exported = syntax::named_children(child)
                        .into_iter()
                        .next()
                        .map(|n| {
                            self.out.annotations.non_references.insert(n.id());
                            syntax::string_value(self.tree.text(n)).to_string()
                        })
                        .unwrap_or_else(|| "*".to_string());
                    reexports.push(self.star_reexport(node));
                    self.out.exports.push(ExportSpecifier {
                        local: None,
                        exported,
                        source: source.clone(),
                    });
                }
                _ => {}
            }
        }

        // export * from "..."
        let star = syntax::children(node).iter().any(|c| c.kind() == "*");
        if star && source.is_some() {
            reexports.push(self.star_reexport(node));
            self.out.exports.push(ExportSpecifier {
                local: None,
                exported: "*".to_string(),
                source: source.clone(),
            });
        }

        if source.is_some() {
            if let Some(path) = self.resolve_source(node) {
                self.out.imports.add(path, reexports);
            }
        }
    }

    fn star_reexport(&self, node: Node<'a>) -> ImportSpecifier {
        ImportSpecifier {
            imported: "*".to_string(),
            local: None,
            decl: None,
            line: node.start_position().row as u32 + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::JsParser;
    use std::path::PathBuf;

    fn bind(source: &str) -> (SyntaxTree, Bound) {
        let tree = JsParser::new()
            .unwrap()
            .parse(Path::new("/app/main.js"), source.to_string())
            .unwrap();
        let resolver = Resolver::default();
        let bound = Binder::new(&tree, Path::new("/app/main.js"), &resolver).bind();
        (tree, bound)
    }

    fn names_in(bound: &Bound, scope: ScopeId) -> Vec<&str> {
        bound
            .scopes
            .declared_names(scope)
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_root_declarations() {
        let (_, bound) = bind("var a; let b; const c = 1; function d() {} class E {}\nimport f from './f';");
        assert_eq!(names_in(&bound, ScopeId::root()), ["a", "b", "c", "d", "E", "f"]);
        let kinds: Vec<_> = bound.declarations.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DeclKind::Var,
                DeclKind::Let,
                DeclKind::Const,
                DeclKind::Function,
                DeclKind::Class,
                DeclKind::Import
            ]
        );
    }

    #[test]
    fn test_function_scope_holds_params_and_vars() {
        let (_, bound) = bind("function f(p, [q]) { if (p) { var v; let l; } }");
        // root, f, f body, if block
        assert_eq!(bound.scopes.len(), 4);
        let func = ScopeId(1);
        assert_eq!(bound.scopes.kind(func), crate::scope::ScopeKind::Function);
        assert_eq!(names_in(&bound, func), ["p", "q", "v"]);
        assert_eq!(names_in(&bound, ScopeId(3)), ["l"]);
    }

    #[test]
    fn test_class_expression_name_is_scoped_to_the_class() {
        let (_, bound) = bind("const A = class B { m() { return B; } };");
        assert_eq!(names_in(&bound, ScopeId::root()), ["A"]);
        assert_eq!(names_in(&bound, ScopeId(1)), ["B"]);
        assert_eq!(bound.declarations[1].kind, DeclKind::ClassName);
        assert!(!bound.declarations[1].removable);
    }

    #[test]
    fn test_scope_annotations_on_boundaries() {
        let (tree, bound) = bind("const f = () => { { } };");
        // arrow, its body, inner block
        assert_eq!(bound.annotations.scopes.len(), 3);
        assert!(!bound.annotations.scopes.contains_key(&tree.root().id()));
    }

    #[test]
    fn test_binding_identifiers_are_not_references() {
        let (tree, bound) = bind("let x = y;");
        let declarator = tree
            .root()
            .named_child(0)
            .and_then(|d| d.named_child(0))
            .unwrap();
        let name = declarator.child_by_field_name("name").unwrap();
        let value = declarator.child_by_field_name("value").unwrap();
        assert!(bound.annotations.non_references.contains(&name.id()));
        assert!(!bound.annotations.non_references.contains(&value.id()));
        assert_eq!(bound.annotations.declarations.get(&declarator.id()), Some(&DeclId(0)));
    }

    #[test]
    fn test_import_table_concatenates_statements() {
        let (_, bound) = bind(
            "import {a} from './dep';\nimport x from 'lib';\nimport {b as c, d} from './dep.js';\nimport './side';",
        );
        assert_eq!(bound.imports.len(), 2);
        let specs = bound.imports.get(Path::new("/app/dep.js")).unwrap();
        let pairs: Vec<_> = specs
            .iter()
            .map(|s| (s.imported.as_str(), s.local.as_deref()))
            .collect();
        assert_eq!(pairs, [("a", Some("a")), ("b", Some("c")), ("d", Some("d"))]);
        assert_eq!(bound.imports.get(Path::new("/app/side.js")).map(|s| s.len()), Some(0));
        assert!(names_in(&bound, ScopeId::root()).contains(&"x"));
    }

    #[test]
    fn test_export_records() {
        let (_, bound) = bind(
            "export const a = 1;\nconst b = 2;\nexport { b as bee };\nexport default b;\nexport * as ns from './ns';",
        );
        let exports: Vec<_> = bound
            .exports
            .iter()
            .map(|e| (e.local.as_deref(), e.exported.as_str()))
            .collect();
        assert_eq!(
            exports,
            [
                (Some("a"), "a"),
                (Some("b"), "bee"),
                (Some("b"), "default"),
                (None, "ns")
            ]
        );
        let paths: Vec<PathBuf> = bound.imports.paths().map(Path::to_path_buf).collect();
        assert_eq!(paths, [PathBuf::from("/app/ns.js")]);
        assert_eq!(bound.declarations.iter().filter(|d| d.exported).count(), 1);
    }

    #[test]
    fn test_loop_and_catch_bindings_are_fixed() {
        let (_, bound) = bind("for (const k in o) {}\nfor (var i = 0;;) {}\ntry {} catch ({message}) {}");
        let fixed: Vec<_> = bound
            .declarations
            .iter()
            .map(|d| (d.display_name(), d.removable))
            .collect();
        assert_eq!(
            fixed,
            [
                ("k".to_string(), false),
                ("i".to_string(), false),
                ("message".to_string(), false)
            ]
        );
        // `var i` in a loop head hoists to the module scope
        assert_eq!(names_in(&bound, ScopeId::root()), ["i"]);
    }
}
