//! Semantic analyzer - scope resolution and usage tracking

use super::diagnostic::Diagnostic;
use super::scope::{ScopeKind, SymbolId, SymbolTable};
use crate::ast::*;
use crate::common::Span;

/// Result of the semantic pass
#[derive(Debug)]
pub struct SemanticModel {
    pub table: SymbolTable,
    /// Findings in source order, followed by unused symbols in declaration order
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks the tree once in source order
///
/// Declarations and lookups happen at the node where they occur, so a read
/// is classified only after every earlier declaration has been resolved.
pub struct SemanticAnalyzer<'a> {
    ast: &'a Ast,
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            table: SymbolTable::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Analyze the whole program
    pub fn analyze(mut self) -> SemanticModel {
        let ast = self.ast;
        for &stmt in ast.statements() {
            self.analyze_statement(stmt);
        }

        let unused: Vec<Diagnostic> = self
            .table
            .symbols()
            .filter(|(_, symbol)| !symbol.used)
            .map(|(id, symbol)| Diagnostic::unused(id, symbol.line, symbol.column))
            .collect();
        self.diagnostics.extend(unused);

        SemanticModel {
            table: self.table,
            diagnostics: self.diagnostics,
        }
    }

    fn analyze_statement(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Declaration { ty, name, name_span, init } => {
                // the initializer cannot see the name it initializes
                if let Some(init) = init {
                    self.analyze_expression(*init);
                }
                let declared = self.table.declare(
                    name,
                    ty.clone(),
                    init.is_some(),
                    name_span.line,
                    name_span.column,
                );
                if let Err(existing) = declared {
                    self.table.symbol_mut(existing).redeclared = true;
                    self.diagnostics
                        .push(Diagnostic::redeclared(existing, name_span.line, name_span.column));
                }
            }
            NodeKind::Assignment { target, target_span, value } => {
                self.analyze_expression(*value);
                match self.table.lookup(target) {
                    Some(symbol) => self.table.symbol_mut(symbol).initialized = true,
                    None => self.diagnostics.push(Diagnostic::undeclared(
                        target.clone(),
                        target_span.line,
                        target_span.column,
                    )),
                }
            }
            NodeKind::ForLoop { var, var_span, iterable, body } => {
                self.analyze_expression(*iterable);
                let element = self.static_type(*iterable).element();

                self.table.push_scope(ScopeKind::For, ast.span(id).line);
                // a fresh scope cannot already bind the loop variable
                let _ = self.table.declare(var, element, true, var_span.line, var_span.column);
                self.analyze_block(*body);
                self.table.pop_scope();
            }
            NodeKind::DoWhileLoop { body, condition } => {
                self.analyze_scoped(ScopeKind::DoWhile, ast.span(id), *body);
                self.analyze_expression(*condition);
            }
            NodeKind::If { condition, body, elifs, else_branch } => {
                self.analyze_expression(*condition);
                self.analyze_scoped(ScopeKind::If, ast.span(id), *body);

                for &elif in elifs {
                    if let NodeKind::Elif { condition, body } = ast.kind(elif) {
                        self.analyze_expression(*condition);
                        self.analyze_scoped(ScopeKind::Elif, ast.span(elif), *body);
                    }
                }

                if let Some(else_id) = else_branch {
                    if let NodeKind::Else { body } = ast.kind(*else_id) {
                        self.analyze_scoped(ScopeKind::Else, ast.span(*else_id), *body);
                    }
                }
            }
            NodeKind::Call { .. } => self.analyze_expression(id),
            NodeKind::Block(_) => self.analyze_block(id),
            _ => {}
        }
    }

    fn analyze_scoped(&mut self, kind: ScopeKind, header: Span, body: NodeId) {
        self.table.push_scope(kind, header.line);
        self.analyze_block(body);
        self.table.pop_scope();
    }

    fn analyze_block(&mut self, block: NodeId) {
        let ast = self.ast;
        for &stmt in ast.block(block) {
            self.analyze_statement(stmt);
        }
    }

    /// Every identifier inside an expression is a read
    fn analyze_expression(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Identifier(name) => {
                let span = ast.span(id);
                self.read(name, span);
            }
            NodeKind::Binary { lhs, rhs, .. } => {
                self.analyze_expression(*lhs);
                self.analyze_expression(*rhs);
            }
            NodeKind::Unary { operand, .. } => self.analyze_expression(*operand),
            NodeKind::Call { args, .. } | NodeKind::ListLiteral(args) => {
                for &arg in args {
                    self.analyze_expression(arg);
                }
            }
            _ => {}
        }
    }

    fn read(&mut self, name: &str, span: Span) {
        let Some(id) = self.table.lookup(name) else {
            self.diagnostics.push(Diagnostic::undeclared(name, span.line, span.column));
            return;
        };

        let symbol = self.table.symbol_mut(id);
        if !symbol.initialized {
            self.diagnostics.push(Diagnostic::used_before_init(id, span.line, span.column));
        }
        symbol.used = true;
    }

    /// Type of an expression when it is obvious without inference
    fn static_type(&self, id: NodeId) -> TypeName {
        match self.ast.kind(id) {
            NodeKind::Literal(literal) => literal.type_name(),
            NodeKind::Identifier(name) => self
                .table
                .lookup(name)
                .map_or(TypeName::Unknown, |symbol| self.symbol_type(symbol)),
            NodeKind::ListLiteral(items) => TypeName::list_of(
                items
                    .first()
                    .map_or(TypeName::Unknown, |&first| self.static_type(first)),
            ),
            _ => TypeName::Unknown,
        }
    }

    fn symbol_type(&self, id: SymbolId) -> TypeName {
        self.table.symbol(id).ty.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::sema::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> SemanticModel {
        let ast = Parser::new(source).unwrap().parse().unwrap();
        SemanticAnalyzer::new(&ast).analyze()
    }

    fn findings(model: &SemanticModel) -> Vec<(DiagnosticKind, String, u32, u32)> {
        model
            .diagnostics
            .iter()
            .map(|d| (d.kind, d.name(&model.table).to_string(), d.line, d.column))
            .collect()
    }

    #[test]
    fn test_redeclaration_keeps_first_binding() {
        let model = analyze("int x\nprint(x)\nint x = 2\n");
        assert_eq!(model.table.len(), 1);

        let (_, x) = model.table.symbols().next().unwrap();
        assert!(x.redeclared);
        assert!(!x.initialized);
        assert!(x.used);
        assert_eq!((x.line, x.column), (1, 5));

        assert_eq!(
            findings(&model),
            vec![
                (DiagnosticKind::UsedBeforeInit, "x".to_string(), 2, 7),
                (DiagnosticKind::Redeclared, "x".to_string(), 3, 5),
            ]
        );
    }

    #[test]
    fn test_sibling_scopes_do_not_clash() {
        let model = analyze("if true:\n  int t = 1\n  print(t)\nelse:\n  int t = 2\n  print(t)\n");
        assert!(model.diagnostics.is_empty());
        assert_eq!(model.table.len(), 2);
    }

    #[test]
    fn test_undeclared_reads_and_assignment() {
        let model = analyze("print(y)\ny = y + 1\n");
        assert_eq!(
            findings(&model),
            vec![
                (DiagnosticKind::Undeclared, "y".to_string(), 1, 7),
                (DiagnosticKind::Undeclared, "y".to_string(), 2, 5),
                (DiagnosticKind::Undeclared, "y".to_string(), 2, 1),
            ]
        );
        assert!(model.table.is_empty());
    }

    #[test]
    fn test_assignment_is_not_a_read() {
        let model = analyze("int x\nx = 5\n");
        let (_, x) = model.table.symbols().next().unwrap();
        assert!(x.initialized);
        assert!(!x.used);
        assert_eq!(findings(&model), vec![(DiagnosticKind::Unused, "x".to_string(), 1, 5)]);
    }

    #[test]
    fn test_initializer_reads_outer_name() {
        let model = analyze("int x = x\n");
        assert_eq!(
            findings(&model),
            vec![
                (DiagnosticKind::Undeclared, "x".to_string(), 1, 9),
                (DiagnosticKind::Unused, "x".to_string(), 1, 5),
            ]
        );
    }

    #[test]
    fn test_each_uninitialized_read_is_reported() {
        let model = analyze("int a\nprint(a, a)\na = 1\nprint(a)\n");
        let kinds: Vec<_> = model.diagnostics.iter().map(|d| (d.kind, d.column)).collect();
        assert_eq!(
            kinds,
            vec![(DiagnosticKind::UsedBeforeInit, 7), (DiagnosticKind::UsedBeforeInit, 10)]
        );
    }

    #[test]
    fn test_loop_variable_takes_element_type() {
        let model = analyze("list[int] nums = [1,2,3]\nfor n in nums:\n n = n + 1\n");
        let symbols: Vec<_> = model
            .table
            .symbols()
            .map(|(_, s)| (s.name.clone(), s.ty.to_string(), model.table.scope_label(s.scope)))
            .collect();
        assert_eq!(
            symbols,
            vec![
                ("nums".to_string(), "list[int]".to_string(), "global".to_string()),
                ("n".to_string(), "int".to_string(), "for@2".to_string()),
            ]
        );
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn test_loop_variable_over_literals_and_strings() {
        let model = analyze("string s = \"ab\"\nfor c in s:\n  print(c)\nfor f in [1.5, 2.5]:\n  print(f)\nfor u in read():\n  print(u)\n");
        let types: Vec<_> = model.table.symbols().map(|(_, s)| s.ty.to_string()).collect();
        assert_eq!(types, vec!["string", "string", "float", "unknown"]);
    }

    #[test]
    fn test_do_while_condition_uses_enclosing_scope() {
        let model = analyze("do:\n  int k = 1\n  print(k)\nwhile (k < 3)\n");
        assert_eq!(findings(&model), vec![(DiagnosticKind::Undeclared, "k".to_string(), 4, 8)]);
    }

    #[test]
    fn test_initialization_is_order_based() {
        let model = analyze("int x\nif read():\n  x = 1\nprint(x)\n");
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn test_unused_in_declaration_order() {
        let model = analyze("int b\nint a\nfor i in [1]:\n  int c = 0\n");
        let names: Vec<_> = model
            .diagnostics
            .iter()
            .map(|d| (d.kind, d.name(&model.table).to_string()))
            .collect();
        assert_eq!(
            names,
            vec![
                (DiagnosticKind::Unused, "b".to_string()),
                (DiagnosticKind::Unused, "a".to_string()),
                (DiagnosticKind::Unused, "i".to_string()),
                (DiagnosticKind::Unused, "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_callee_is_not_a_variable() {
        let model = analyze("int x = read()\nprint(x)\n");
        assert!(model.diagnostics.is_empty());
    }
}
