//! Instruction-category counters and per-type symbol counts

use crate::ast::{Ast, NodeId, NodeKind};
use crate::sema::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters gathered over one program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Symbols per declared type, sorted by type name
    pub type_counts: BTreeMap<String, usize>,
    pub declarations: usize,
    pub assignments: usize,
    /// Identifier reads plus assignment targets
    pub read_write: usize,
    /// One per `if` or `elif` test
    pub conditionals: usize,
    /// Loops of either kind
    pub cyclic: usize,
    /// Deepest loop/conditional body nesting; top level is 0
    pub nestings: usize,
}

impl Statistics {
    /// Count everything in `ast`, taking type counts from the resolved `table`
    pub fn collect(ast: &Ast, table: &SymbolTable) -> Self {
        let mut collector = Collector {
            ast,
            stats: Statistics::default(),
            depth: 0,
        };
        for &stmt in ast.statements() {
            collector.statement(stmt);
        }

        let mut stats = collector.stats;
        for (_, symbol) in table.symbols() {
            *stats.type_counts.entry(symbol.ty.to_string()).or_insert(0) += 1;
        }
        stats
    }
}

struct Collector<'a> {
    ast: &'a Ast,
    stats: Statistics,
    depth: usize,
}

impl Collector<'_> {
    fn statement(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Declaration { init, .. } => {
                self.stats.declarations += 1;
                if let Some(init) = init {
                    self.expression(*init);
                }
            }
            NodeKind::Assignment { value, .. } => {
                self.stats.assignments += 1;
                self.stats.read_write += 1;
                self.expression(*value);
            }
            NodeKind::ForLoop { iterable, body, .. } => {
                self.stats.cyclic += 1;
                self.expression(*iterable);
                self.nested(*body);
            }
            NodeKind::DoWhileLoop { body, condition } => {
                self.stats.cyclic += 1;
                self.nested(*body);
                self.expression(*condition);
            }
            NodeKind::If { condition, body, elifs, else_branch } => {
                self.stats.conditionals += 1;
                self.expression(*condition);
                self.nested(*body);
                for &elif in elifs {
                    self.statement(elif);
                }
                if let Some(else_id) = else_branch {
                    self.statement(*else_id);
                }
            }
            NodeKind::Elif { condition, body } => {
                self.stats.conditionals += 1;
                self.expression(*condition);
                self.nested(*body);
            }
            NodeKind::Else { body } => self.nested(*body),
            NodeKind::Call { .. } => self.expression(id),
            _ => {}
        }
    }

    fn nested(&mut self, body: NodeId) {
        self.depth += 1;
        self.stats.nestings = self.stats.nestings.max(self.depth);
        let ast = self.ast;
        for &stmt in ast.block(body) {
            self.statement(stmt);
        }
        self.depth -= 1;
    }

    fn expression(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Identifier(_) => self.stats.read_write += 1,
            NodeKind::Binary { lhs, rhs, .. } => {
                self.expression(*lhs);
                self.expression(*rhs);
            }
            NodeKind::Unary { operand, .. } => self.expression(*operand),
            NodeKind::Call { args, .. } | NodeKind::ListLiteral(args) => {
                for &arg in args {
                    self.expression(arg);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::sema::SemanticAnalyzer;
    use pretty_assertions::assert_eq;

    fn stats(source: &str) -> Statistics {
        let ast = Parser::new(source).unwrap().parse().unwrap();
        let model = SemanticAnalyzer::new(&ast).analyze();
        Statistics::collect(&ast, &model.table)
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(stats(""), Statistics::default());
    }

    #[test]
    fn test_for_loop_counts() {
        let s = stats("list[int] nums = [1,2,3]\nfor n in nums:\n n = n + 1\n");
        assert_eq!(s.declarations, 1);
        assert_eq!(s.assignments, 1);
        assert_eq!(s.cyclic, 1);
        assert_eq!(s.nestings, 1);
        // nums, n (read) and n (target)
        assert_eq!(s.read_write, 3);
        let expected: BTreeMap<String, usize> =
            [("int".to_string(), 1), ("list[int]".to_string(), 1)].into_iter().collect();
        assert_eq!(s.type_counts, expected);
    }

    #[test]
    fn test_conditionals_count_each_test() {
        let s = stats("int a = 1\nif a:\n  a = 2\nelif a:\n  a = 3\nelif a:\n  a = 4\nelse:\n  a = 5\n");
        assert_eq!(s.conditionals, 3);
        assert_eq!(s.nestings, 1);
        assert_eq!(s.assignments, 4);
    }

    #[test]
    fn test_nesting_tracks_maximum_depth() {
        let source = "\
int i = 0
do:
    for x in [1]:
        if x:
            print(x)
    i = i + 1
while (i < 3)
if i:
    print(i)
";
        let s = stats(source);
        assert_eq!(s.nestings, 3);
        assert_eq!(s.cyclic, 2);
        // `if x:` inside the loops and the top-level `if i:`
        assert_eq!(s.conditionals, 2);
    }

    #[test]
    fn test_redeclaration_counts() {
        let s = stats("int x\nprint(x)\nint x = 2\n");
        assert_eq!(s.declarations, 2);
        assert_eq!(s.type_counts.get("int"), Some(&1));
        assert_eq!(s.read_write, 1);
    }
}
