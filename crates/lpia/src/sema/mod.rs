//! Semantic analysis module
//!
//! Builds the scoped symbol table and collects the four kinds of
//! non-fatal findings (redeclared, undeclared, unused, used before
//! initialization) in a single ordered walk over the tree.

mod analyzer;
mod diagnostic;
mod scope;

pub use analyzer::{SemanticAnalyzer, SemanticModel};
pub use diagnostic::{Diagnostic, DiagnosticKind, Subject};
pub use scope::{Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolTable};
