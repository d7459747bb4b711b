//! Scope Model - Lexical scopes and the declarations bound in them
//!
//! Every module gets one `ScopeTree`. Function boundaries open
//! function scopes, braces open block scopes, and each declaration is
//! registered in the scope its hoisting class selects.

pub mod binding;
pub mod graph;

pub use binding::{DeclId, DeclKind, Declaration};
pub use graph::{ScopeId, ScopeKind, ScopeTree};
