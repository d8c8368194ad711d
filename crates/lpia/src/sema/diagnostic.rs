//! Non-fatal semantic findings

use super::scope::{SymbolId, SymbolTable};
use std::fmt;

/// Kind of semantic finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Redeclared,
    Undeclared,
    Unused,
    UsedBeforeInit,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticKind::Redeclared => "redeclared",
            DiagnosticKind::Undeclared => "undeclared",
            DiagnosticKind::Unused => "unused",
            DiagnosticKind::UsedBeforeInit => "used before initialization",
        };
        f.write_str(text)
    }
}

/// What a finding is about
///
/// Undeclared names never get a symbol, every other kind refers to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Symbol(SymbolId),
    Name(String),
}

/// One finding at a source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: Subject,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn redeclared(symbol: SymbolId, line: u32, column: u32) -> Self {
        Self::for_symbol(DiagnosticKind::Redeclared, symbol, line, column)
    }

    pub fn undeclared(name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind: DiagnosticKind::Undeclared,
            subject: Subject::Name(name.into()),
            line,
            column,
        }
    }

    pub fn unused(symbol: SymbolId, line: u32, column: u32) -> Self {
        Self::for_symbol(DiagnosticKind::Unused, symbol, line, column)
    }

    pub fn used_before_init(symbol: SymbolId, line: u32, column: u32) -> Self {
        Self::for_symbol(DiagnosticKind::UsedBeforeInit, symbol, line, column)
    }

    fn for_symbol(kind: DiagnosticKind, symbol: SymbolId, line: u32, column: u32) -> Self {
        Self {
            kind,
            subject: Subject::Symbol(symbol),
            line,
            column,
        }
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        match self.subject {
            Subject::Symbol(id) => Some(id),
            Subject::Name(_) => None,
        }
    }

    /// Name the finding is about
    pub fn name<'a>(&'a self, table: &'a SymbolTable) -> &'a str {
        match &self.subject {
            Subject::Symbol(id) => &table.symbol(*id).name,
            Subject::Name(name) => name,
        }
    }
}
