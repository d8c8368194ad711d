//! Symbol table and scope management
//!
//! Scopes live in an arena and point at their parent by [`ScopeId`], so a
//! closed scope stays in the table for reporting after the walk leaves it.

use crate::ast::TypeName;
use std::collections::HashMap;

/// Index of a scope in its [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Index of a symbol in its [`SymbolTable`], in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

/// Construct that opened a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    For,
    DoWhile,
    If,
    Elif,
    Else,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::For => "for",
            ScopeKind::DoWhile => "do",
            ScopeKind::If => "if",
            ScopeKind::Elif => "elif",
            ScopeKind::Else => "else",
        }
    }
}

/// A declared name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeName,
    pub scope: ScopeId,
    pub initialized: bool,
    pub used: bool,
    pub redeclared: bool,
    /// Position of the first declaration
    pub line: u32,
    pub column: u32,
}

/// A binding region
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Line of the header that opened the scope (0 for the global scope)
    pub line: u32,
    parent: Option<ScopeId>,
    bindings: HashMap<String, SymbolId>,
}

impl Scope {
    fn new(kind: ScopeKind, line: u32, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            line,
            parent,
            bindings: HashMap::new(),
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.bindings.get(name).copied()
    }
}

/// Every scope and symbol seen during one analysis run
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, 0, None)],
            symbols: Vec::new(),
            current: ScopeId(0),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Open a child of the current scope and make it current
    pub fn push_scope(&mut self, kind: ScopeKind, line: u32) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, line, Some(self.current)));
        self.current = id;
        id
    }

    /// Return to the parent scope; the global scope is never popped
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scope(self.current).parent {
            self.current = parent;
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.scope(self.current).lookup_local(name)
    }

    /// Resolve a name from the innermost scope outwards
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let current = self.scope(id);
            if let Some(symbol) = current.lookup_local(name) {
                return Some(symbol);
            }
            scope = current.parent;
        }
        None
    }

    /// Bind a new symbol in the current scope
    ///
    /// If the name is already bound here, nothing is created and the
    /// existing symbol comes back as the error.
    pub fn declare(
        &mut self,
        name: &str,
        ty: TypeName,
        initialized: bool,
        line: u32,
        column: u32,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.lookup_local(name) {
            return Err(existing);
        }

        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            scope: self.current,
            initialized,
            used: false,
            redeclared: false,
            line,
            column,
        });
        self.scopes[self.current.0].bindings.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Symbols in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, symbol)| (SymbolId(i), symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Printable scope name: `global`, or `<kind>@<line>` such as `for@2`
    pub fn scope_label(&self, id: ScopeId) -> String {
        let scope = self.scope(id);
        match scope.kind {
            ScopeKind::Global => ScopeKind::Global.as_str().to_string(),
            kind => format!("{}@{}", kind.as_str(), scope.line),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut table = SymbolTable::new();
        let x = table.declare("x", TypeName::Int, false, 1, 5).unwrap();
        assert_eq!(table.lookup("x"), Some(x));
        assert_eq!(table.lookup("y"), None);
        assert_eq!(table.symbol(x).scope, table.current());
    }

    #[test]
    fn test_redeclaration_returns_existing() {
        let mut table = SymbolTable::new();
        let first = table.declare("x", TypeName::Int, false, 1, 5).unwrap();
        assert_eq!(table.declare("x", TypeName::Float, true, 3, 7), Err(first));
        assert_eq!(table.len(), 1);
        assert_eq!(table.symbol(first).ty, TypeName::Int);
    }

    #[test]
    fn test_lookup_walks_outwards() {
        let mut table = SymbolTable::new();
        let outer = table.declare("x", TypeName::Int, true, 1, 5).unwrap();
        table.push_scope(ScopeKind::For, 2);
        assert_eq!(table.lookup("x"), Some(outer));
        assert_eq!(table.lookup_local("x"), None);

        let inner = table.declare("x", TypeName::Str, true, 3, 12).unwrap();
        assert_eq!(table.lookup("x"), Some(inner));

        table.pop_scope();
        assert_eq!(table.lookup("x"), Some(outer));
    }

    #[test]
    fn test_sibling_scopes_are_disjoint() {
        let mut table = SymbolTable::new();
        table.push_scope(ScopeKind::If, 1);
        assert!(table.declare("t", TypeName::Int, true, 2, 9).is_ok());
        table.pop_scope();
        table.push_scope(ScopeKind::Else, 3);
        assert!(table.lookup("t").is_none());
        assert!(table.declare("t", TypeName::Int, true, 4, 9).is_ok());
        table.pop_scope();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_scope_labels() {
        let mut table = SymbolTable::new();
        let global = table.current();
        let body = table.push_scope(ScopeKind::DoWhile, 4);
        let branch = table.push_scope(ScopeKind::Elif, 6);
        assert_eq!(table.scope_label(global), "global");
        assert_eq!(table.scope_label(body), "do@4");
        assert_eq!(table.scope_label(branch), "elif@6");
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut table = SymbolTable::new();
        let global = table.current();
        table.pop_scope();
        assert_eq!(table.current(), global);
    }
}
