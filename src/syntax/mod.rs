//! Syntax layer - Tree-sitter parser adapter and node classification
//!
//! The analysis passes never mutate the tree. They annotate nodes through
//! side tables keyed by `Node::id()` and describe removals as byte ranges
//! that the printer splices out of the original text.

pub mod printer;

use std::path::Path;

use tree_sitter::{Node, Parser, Point, Tree};

use crate::scope::ScopeKind;
use crate::{Error, Result};

pub use printer::{print, Splice};

/// A parsed module: the source text and the tree over it
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }
}

/// JavaScript parser adapter
pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parse module text. Any ERROR or MISSING node fails the parse with
    /// the position of the first one.
    pub fn parse(&mut self, path: &Path, source: String) -> Result<SyntaxTree> {
        let tree = self.parser.parse(&source, None).ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
        })?;

        if let Some(bad) = first_error(tree.root_node()) {
            let Point { row, column } = bad.start_position();
            return Err(Error::Parse {
                path: path.to_path_buf(),
                line: row + 1,
                column: column + 1,
            });
        }

        Ok(SyntaxTree { source, tree })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Structural kinds the passes distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    Method,
    Block,
    /// `for (init; test; update)`
    ForLoop,
    /// `for (x in o)` and `for (x of o)`
    ForInLoop,
    CatchClause,
    SwitchBody,
    /// `var` declaration statement
    VarDeclaration,
    /// `let` / `const` declaration statement
    LexicalDeclaration,
    ClassDeclaration,
    ClassExpression,
    ImportDeclaration,
    ExportDeclaration,
    /// Non-computed `obj.prop`
    MemberAccess,
    Identifier,
    Other,
}

impl NodeKind {
    pub fn of(node: Node<'_>) -> Self {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => NodeKind::FunctionDeclaration,
            "function_expression" | "generator_function" => NodeKind::FunctionExpression,
            "arrow_function" => NodeKind::ArrowFunction,
            "method_definition" => NodeKind::Method,
            "statement_block" => NodeKind::Block,
            "for_statement" => NodeKind::ForLoop,
            "for_in_statement" => NodeKind::ForInLoop,
            "catch_clause" => NodeKind::CatchClause,
            "switch_body" => NodeKind::SwitchBody,
            "variable_declaration" => NodeKind::VarDeclaration,
            "lexical_declaration" => NodeKind::LexicalDeclaration,
            "class_declaration" => NodeKind::ClassDeclaration,
            "class" => NodeKind::ClassExpression,
            "import_statement" => NodeKind::ImportDeclaration,
            "export_statement" => NodeKind::ExportDeclaration,
            "member_expression" => NodeKind::MemberAccess,
            "identifier" | "shorthand_property_identifier" | "shorthand_property_identifier_pattern" => {
                NodeKind::Identifier
            }
            _ => NodeKind::Other,
        }
    }

    /// The scope a node of this kind opens, if any
    pub fn scope_kind(self) -> Option<ScopeKind> {
        match self {
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunction
            | NodeKind::Method => Some(ScopeKind::Function),
            NodeKind::Block
            | NodeKind::ForLoop
            | NodeKind::ForInLoop
            | NodeKind::CatchClause
            | NodeKind::SwitchBody
            | NodeKind::ClassExpression => Some(ScopeKind::Block),
            _ => None,
        }
    }
}

/// Nodes whose children are statements that can be dropped outright
pub fn is_statement_list(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "program" | "statement_block" | "switch_case" | "switch_default"
    )
}

/// Whether a declaration statement can be deleted without breaking its
/// parent: it must sit in a statement list, directly or via `export`.
pub fn is_removable_statement(node: Node<'_>) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => {
            parent.parent().is_some_and(is_statement_list)
        }
        Some(parent) => is_statement_list(parent),
        None => false,
    }
}

/// Whether a declaration is the `declaration` of an export statement
pub fn is_exported(node: Node<'_>) -> bool {
    node.parent().is_some_and(|p| p.kind() == "export_statement")
}

/// Named children of a node, collected so the cursor borrow ends
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children of a node, anonymous tokens included
pub fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Strip the quotes of a string literal node's text
pub fn string_value(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
