//! Declaration handles
//!
//! A declaration is the syntax node that introduces one or more names:
//! a function or class declaration, a variable declarator, an import
//! specifier, a parameter. Each carries the liveness flag the marker
//! sets and the pruner reads.

use std::ops::Range;

use serde::Serialize;

use super::graph::ScopeId;

/// Index of a declaration within its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What introduced a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Function,
    Var,
    Let,
    Const,
    Class,
    Import,
    /// Function, arrow or method parameter
    Param,
    /// Catch clause parameter
    Catch,
    /// The own name of a named function expression
    FunctionName,
    /// The own name of a named class expression
    ClassName,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
            DeclKind::Class => "class",
            DeclKind::Import => "import",
            DeclKind::Param => "param",
            DeclKind::Catch => "catch",
            DeclKind::FunctionName => "function-name",
            DeclKind::ClassName => "class-name",
        }
    }

    /// `let`, `const`, `class` and `import` stay in their innermost scope
    pub fn is_block_declaration(&self) -> bool {
        !matches!(self, DeclKind::Function | DeclKind::Var)
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declaration node handle
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    /// Every name the node binds; more than one for destructuring
    pub names: Vec<String>,
    /// Tree-sitter id of the declaring node
    #[serde(skip)]
    pub node_id: usize,
    /// Byte range of the declaring node
    #[serde(skip)]
    pub range: Range<usize>,
    /// Line number of the declaring node (1-indexed)
    pub line: u32,
    /// Scope the names were registered in
    pub scope: ScopeId,
    /// Whether the pruner may delete this node
    pub removable: bool,
    /// Part of the module interface
    pub exported: bool,
    pub live: bool,
    /// Number of live references that resolved here
    pub references: u32,
}

impl Declaration {
    /// Removable and never reached by a live reference
    pub fn is_dead(&self) -> bool {
        self.removable && !self.live
    }

    /// Names joined for display
    pub fn display_name(&self) -> String {
        self.names.join(", ")
    }
}
