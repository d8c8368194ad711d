//! Source rendering of expressions

use super::{Ast, NodeId, NodeKind};

/// Render an expression back to LPI source with minimal parentheses
pub fn render_expr(ast: &Ast, id: NodeId) -> String {
    let mut out = String::new();
    write_expr(ast, id, 0, &mut out);
    out
}

/// Render `id` so that it binds at least as tightly as `min_prec`
pub(crate) fn render_operand(ast: &Ast, id: NodeId, min_prec: u8) -> String {
    let mut out = String::new();
    write_expr(ast, id, min_prec, &mut out);
    out
}

fn precedence(ast: &Ast, id: NodeId) -> u8 {
    match ast.kind(id) {
        NodeKind::Binary { op, .. } => op.precedence(),
        NodeKind::Unary { op, .. } => op.precedence(),
        _ => u8::MAX,
    }
}

fn write_expr(ast: &Ast, id: NodeId, min_prec: u8, out: &mut String) {
    let prec = precedence(ast, id);
    let wrap = prec < min_prec;
    if wrap {
        out.push('(');
    }

    match ast.kind(id) {
        NodeKind::Identifier(name) => out.push_str(name),
        NodeKind::Literal(lit) => out.push_str(&lit.to_string()),
        NodeKind::ListLiteral(items) => {
            out.push('[');
            write_list(ast, items, out);
            out.push(']');
        }
        NodeKind::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            write_list(ast, args, out);
            out.push(')');
        }
        NodeKind::Unary { op, operand } => {
            out.push_str(op.as_str());
            write_expr(ast, *operand, prec, out);
        }
        NodeKind::Binary { op, lhs, rhs } => {
            // comparisons do not chain, so both sides need a tighter operator
            let (left_min, right_min) = if op.is_right_associative() {
                (prec + 1, prec)
            } else if op.is_comparison() {
                (prec + 1, prec + 1)
            } else {
                (prec, prec + 1)
            };
            write_expr(ast, *lhs, left_min, out);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(ast, *rhs, right_min, out);
        }
        other => out.push_str(&format!("<{other:?}>")),
    }

    if wrap {
        out.push(')');
    }
}

fn write_list(ast: &Ast, items: &[NodeId], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(ast, *item, 0, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    /// Render the value of the first statement, `x = <expr>`
    fn round(source: &str) -> String {
        let ast = Parser::new(source).unwrap().parse().unwrap();
        match ast.kind(ast.statements()[0]) {
            NodeKind::Assignment { value, .. } => render_expr(&ast, *value),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(round("x = (a + b) * c"), "(a + b) * c");
        assert_eq!(round("x = a + (b * c)"), "a + b * c");
        assert_eq!(round("x = a - (b - c)"), "a - (b - c)");
        assert_eq!(round("x = (a - b) - c"), "a - b - c");
    }

    #[test]
    fn test_power_and_negation() {
        assert_eq!(round("x = 2 ^ 3 ^ 2"), "2 ^ 3 ^ 2");
        assert_eq!(round("x = (2 ^ 3) ^ 2"), "(2 ^ 3) ^ 2");
        assert_eq!(round("x = -2 ^ 2"), "-2 ^ 2");
        assert_eq!(round("x = (-2) ^ 2"), "(-2) ^ 2");
    }

    #[test]
    fn test_logic_calls_and_lists() {
        assert_eq!(round("x = not (a or b) and c"), "not (a or b) and c");
        assert_eq!(round("x = (a < b) == c"), "(a < b) == c");
        assert_eq!(round("x = f(a, [1, 2.5, \"s\"], true)"), "f(a, [1, 2.5, \"s\"], true)");
    }
}
