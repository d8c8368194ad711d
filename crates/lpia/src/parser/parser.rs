//! Recursive descent parser for LPI

use crate::ast::*;
use crate::common::{AnalysisError, AnalysisResult, Span};
use crate::lexer::{Lexer, Token, TokenKind};

/// Deepest allowed nesting of blocks, parentheses and prefix operators
const MAX_NESTING: usize = 128;

/// Recursive descent parser for LPI
///
/// Stops at the first mismatch; there is no error recovery.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Span of the last consumed token
    previous: Span,
    builder: AstBuilder,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> AnalysisResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            previous: current.span,
            current,
            builder: AstBuilder::new(),
            depth: 0,
        })
    }

    /// Parse a complete program
    pub fn parse(mut self) -> AnalysisResult<Ast> {
        let start = self.current.span;
        let mut statements = Vec::new();

        while !self.at_end() {
            if self.match_token(&TokenKind::Newline)? {
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        let span = start.merge(self.current.span);
        let root = self.builder.push(NodeKind::Program(statements), span);
        Ok(self.builder.finish(root))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> AnalysisResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        self.previous = prev.span;
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> AnalysisResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> AnalysisResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(self.error(kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> AnalysisResult<(String, Span)> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance()?;
                Ok((name, token.span))
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// Statements end at a newline (the lexer always emits one before `Eof`)
    fn expect_line_end(&mut self) -> AnalysisResult<()> {
        if self.at_end() {
            return Ok(());
        }
        self.expect(TokenKind::Newline).map(|_| ())
    }

    fn error(&self, expected: impl Into<String>) -> AnalysisError {
        AnalysisError::syntax(expected, self.current.kind.to_string(), self.current.span)
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`]
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> AnalysisResult<T>) -> AnalysisResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("at most {MAX_NESTING} nested levels")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.builder.push(kind, span)
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.builder.span(id)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> AnalysisResult<NodeId> {
        if self.current.kind.is_type_keyword() {
            return self.parse_declaration();
        }

        match &self.current.kind {
            TokenKind::Identifier(_) => self.parse_assignment_or_call(),
            TokenKind::For => self.parse_for(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::If => self.parse_if(),
            _ => Err(self.error("statement")),
        }
    }

    /// type name ["=" expr]
    fn parse_declaration(&mut self) -> AnalysisResult<NodeId> {
        let start = self.current.span;
        let ty = self.parse_type()?;
        let (name, name_span) = self.expect_identifier()?;

        let init = if self.match_token(&TokenKind::Eq)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let span = start.merge(self.previous);
        self.expect_line_end()?;
        Ok(self.push(NodeKind::Declaration { ty, name, name_span, init }, span))
    }

    fn parse_type(&mut self) -> AnalysisResult<TypeName> {
        let ty = match &self.current.kind {
            TokenKind::Int => TypeName::Int,
            TokenKind::Float => TypeName::Float,
            TokenKind::Str => TypeName::Str,
            TokenKind::Bool => TypeName::Bool,
            TokenKind::List => {
                self.advance()?;
                self.expect(TokenKind::LBracket)?;
                let element = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                return Ok(TypeName::list_of(element));
            }
            _ => return Err(self.error("type")),
        };
        self.advance()?;
        Ok(ty)
    }

    /// name "=" expr | name "(" args ")"
    fn parse_assignment_or_call(&mut self) -> AnalysisResult<NodeId> {
        let (name, name_span) = self.expect_identifier()?;

        let node = match &self.current.kind {
            TokenKind::Eq => {
                self.advance()?;
                let value = self.parse_expression()?;
                let span = name_span.merge(self.span_of(value));
                self.push(
                    NodeKind::Assignment {
                        target: name,
                        target_span: name_span,
                        value,
                    },
                    span,
                )
            }
            TokenKind::LParen => self.parse_call(name, name_span)?,
            _ => return Err(self.error("'=' or '('")),
        };

        self.expect_line_end()?;
        Ok(node)
    }

    /// for name in expr: block
    fn parse_for(&mut self) -> AnalysisResult<NodeId> {
        let start = self.expect(TokenKind::For)?.span;
        let (var, var_span) = self.expect_identifier()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = start.merge(self.span_of(body));
        Ok(self.push(NodeKind::ForLoop { var, var_span, iterable, body }, span))
    }

    /// do: block while (expr)
    fn parse_do_while(&mut self) -> AnalysisResult<NodeId> {
        let start = self.expect(TokenKind::Do)?.span;
        let body = self.parse_block()?;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let span = start.merge(self.previous);
        self.expect_line_end()?;
        Ok(self.push(NodeKind::DoWhileLoop { body, condition }, span))
    }

    /// if expr: block (elif expr: block)* [else: block]
    ///
    /// Branches attach to the `if` at the same indentation level.
    fn parse_if(&mut self) -> AnalysisResult<NodeId> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        let mut end = self.span_of(body);

        let mut elifs = Vec::new();
        while self.check(&TokenKind::Elif) {
            let elif_start = self.advance()?.span;
            let condition = self.parse_expression()?;
            let body = self.parse_block()?;
            end = self.span_of(body);
            elifs.push(self.push(NodeKind::Elif { condition, body }, elif_start.merge(end)));
        }

        let else_branch = if self.check(&TokenKind::Else) {
            let else_start = self.advance()?.span;
            let body = self.parse_block()?;
            end = self.span_of(body);
            Some(self.push(NodeKind::Else { body }, else_start.merge(end)))
        } else {
            None
        };

        Ok(self.push(
            NodeKind::If { condition, body, elifs, else_branch },
            start.merge(end),
        ))
    }

    /// ":" NEWLINE INDENT statement+ DEDENT
    fn parse_block(&mut self) -> AnalysisResult<NodeId> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> AnalysisResult<NodeId> {
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        let start = self.expect(TokenKind::Indent)?.span;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::Dedent) {
            if self.at_end() {
                return Err(self.error("dedent"));
            }
            if self.match_token(&TokenKind::Newline)? {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.advance()?;

        let span = statements
            .iter()
            .fold(start, |span, &id| span.merge(self.span_of(id)));
        Ok(self.push(NodeKind::Block(statements), span))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn parse_expression(&mut self) -> AnalysisResult<NodeId> {
        self.nested(Self::parse_or_expression)
    }

    fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let span = self.span_of(lhs).merge(self.span_of(rhs));
        self.push(NodeKind::Binary { op, lhs, rhs }, span)
    }

    fn parse_or_expression(&mut self) -> AnalysisResult<NodeId> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&TokenKind::Or)? {
            let right = self.parse_and_expression()?;
            left = self.binary(BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> AnalysisResult<NodeId> {
        let mut left = self.parse_not_expression()?;

        while self.match_token(&TokenKind::And)? {
            let right = self.parse_not_expression()?;
            left = self.binary(BinaryOp::And, left, right);
        }

        Ok(left)
    }

    fn parse_not_expression(&mut self) -> AnalysisResult<NodeId> {
        if self.check(&TokenKind::Not) {
            let start = self.advance()?.span;
            let operand = self.nested(Self::parse_not_expression)?;
            let span = start.merge(self.span_of(operand));
            return Ok(self.push(NodeKind::Unary { op: UnaryOp::Not, operand }, span));
        }
        self.parse_comparison_expression()
    }

    /// Comparisons do not chain: `a < b < c` is rejected by the caller
    fn parse_comparison_expression(&mut self) -> AnalysisResult<NodeId> {
        let left = self.parse_additive_expression()?;

        let op = match &self.current.kind {
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.advance()?;
        let right = self.parse_additive_expression()?;
        Ok(self.binary(op, left, right))
    }

    fn parse_additive_expression(&mut self) -> AnalysisResult<NodeId> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expression()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> AnalysisResult<NodeId> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expression()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> AnalysisResult<NodeId> {
        if self.check(&TokenKind::Minus) {
            let start = self.advance()?.span;
            let operand = self.nested(Self::parse_unary_expression)?;
            let span = start.merge(self.span_of(operand));
            return Ok(self.push(NodeKind::Unary { op: UnaryOp::Neg, operand }, span));
        }
        self.parse_power_expression()
    }

    /// `^` is right-associative and binds tighter than unary minus
    fn parse_power_expression(&mut self) -> AnalysisResult<NodeId> {
        let base = self.parse_primary_expression()?;

        if self.match_token(&TokenKind::Caret)? {
            let exponent = self.nested(Self::parse_unary_expression)?;
            return Ok(self.binary(BinaryOp::Pow, base, exponent));
        }

        Ok(base)
    }

    fn parse_primary_expression(&mut self) -> AnalysisResult<NodeId> {
        let span = self.current.span;

        let literal = match &self.current.kind {
            TokenKind::IntLiteral(text) => Literal::Int(text.clone()),
            TokenKind::FloatLiteral(text) => Literal::Float(text.clone()),
            TokenKind::StringLiteral(text) => Literal::Str(text.clone()),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::Identifier(_) => {
                let (name, name_span) = self.expect_identifier()?;
                if self.check(&TokenKind::LParen) {
                    return self.parse_call(name, name_span);
                }
                return Ok(self.push(NodeKind::Identifier(name), name_span));
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance()?;
                let items = self.parse_arguments(&TokenKind::RBracket)?;
                let span = span.merge(self.previous);
                return Ok(self.push(NodeKind::ListLiteral(items), span));
            }
            _ => return Err(self.error("expression")),
        };

        self.advance()?;
        Ok(self.push(NodeKind::Literal(literal), span))
    }

    /// name "(" args ")", with the name already consumed
    fn parse_call(&mut self, callee: String, name_span: Span) -> AnalysisResult<NodeId> {
        self.expect(TokenKind::LParen)?;
        let args = self.parse_arguments(&TokenKind::RParen)?;
        let span = name_span.merge(self.previous);
        Ok(self.push(NodeKind::Call { callee, args }, span))
    }

    /// Comma-separated expressions up to and including `close`; a trailing comma is allowed
    fn parse_arguments(&mut self, close: &TokenKind) -> AnalysisResult<Vec<NodeId>> {
        let mut items = Vec::new();

        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        self.expect(close.clone())?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Ast {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn parse_err(source: &str) -> AnalysisError {
        match Parser::new(source).and_then(Parser::parse) {
            Ok(ast) => panic!("expected an error, got {ast:?}"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_parse_declarations() {
        let ast = parse("int x\nlist[list[float]] grid = [[1.5], []]\n");
        let stmts = ast.statements();
        assert_eq!(stmts.len(), 2);

        match ast.kind(stmts[0]) {
            NodeKind::Declaration { ty, name, init, name_span } => {
                assert_eq!(*ty, TypeName::Int);
                assert_eq!(name, "x");
                assert!(init.is_none());
                assert_eq!((name_span.line, name_span.column), (1, 5));
            }
            other => panic!("expected declaration, got {other:?}"),
        }

        match ast.kind(stmts[1]) {
            NodeKind::Declaration { ty, init: Some(init), .. } => {
                assert_eq!(ty.to_string(), "list[list[float]]");
                assert!(matches!(ast.kind(*init), NodeKind::ListLiteral(items) if items.len() == 2));
            }
            other => panic!("expected initialized declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_assignment_and_calls() {
        let ast = parse("int x = read()\nx = x + 1\nprint(x, \"done\",)\n");
        let stmts = ast.statements();

        match ast.kind(stmts[0]) {
            NodeKind::Declaration { init: Some(init), .. } => {
                assert!(matches!(ast.kind(*init), NodeKind::Call { callee, args } if callee == "read" && args.is_empty()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(ast.kind(stmts[1]), NodeKind::Assignment { target, .. } if target == "x"));
        assert!(matches!(ast.kind(stmts[2]), NodeKind::Call { callee, args } if callee == "print" && args.len() == 2));
    }

    #[test]
    fn test_parse_for_loop() {
        let ast = parse("list[int] nums = [1,2,3]\nfor n in nums:\n n = n + 1\n");
        match ast.kind(ast.statements()[1]) {
            NodeKind::ForLoop { var, var_span, iterable, body } => {
                assert_eq!(var, "n");
                assert_eq!((var_span.line, var_span.column), (2, 5));
                assert!(matches!(ast.kind(*iterable), NodeKind::Identifier(name) if name == "nums"));
                assert_eq!(ast.block(*body).len(), 1);
            }
            other => panic!("expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_do_while() {
        let ast = parse("int i = 0\ndo:\n    i = i + 1\n    print(i)\nwhile (i < 10)\nprint(i)\n");
        let stmts = ast.statements();
        assert_eq!(stmts.len(), 3);
        match ast.kind(stmts[1]) {
            NodeKind::DoWhileLoop { body, condition } => {
                assert_eq!(ast.block(*body).len(), 2);
                assert!(matches!(ast.kind(*condition), NodeKind::Binary { op: BinaryOp::Lt, .. }));
            }
            other => panic!("expected do-while, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_chain() {
        let source = "if a:\n  b = 1\nelif c:\n  b = 2\nelif d:\n  b = 3\nelse:\n  b = 4\n";
        let ast = parse(source);
        assert_eq!(ast.statements().len(), 1);
        match ast.kind(ast.statements()[0]) {
            NodeKind::If { elifs, else_branch, .. } => {
                assert_eq!(elifs.len(), 2);
                assert_eq!(ast.span(elifs[0]).line, 3);
                assert_eq!(ast.span(elifs[1]).line, 5);
                let else_id = else_branch.expect("else branch");
                assert_eq!((ast.span(else_id).line, ast.span(else_id).column), (7, 1));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_else_attaches_to_enclosing_level() {
        let source = "if a:\n  if b:\n    x = 1\nelse:\n  x = 2\n";
        let ast = parse(source);
        match ast.kind(ast.statements()[0]) {
            NodeKind::If { body, else_branch, .. } => {
                assert!(else_branch.is_some());
                let inner = ast.block(*body)[0];
                assert!(matches!(ast.kind(inner), NodeKind::If { else_branch: None, .. }));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_operator_precedence() {
        let ast = parse("x = 1 + 2 * 3 ^ 2\n");
        let NodeKind::Assignment { value, .. } = ast.kind(ast.statements()[0]) else {
            panic!("expected assignment");
        };
        let NodeKind::Binary { op: BinaryOp::Add, rhs, .. } = ast.kind(*value) else {
            panic!("expected addition at the root");
        };
        let NodeKind::Binary { op: BinaryOp::Mul, rhs: power, .. } = ast.kind(*rhs) else {
            panic!("expected multiplication");
        };
        assert!(matches!(ast.kind(*power), NodeKind::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_power_is_right_associative_and_beats_negation() {
        let ast = parse("x = -2 ^ 3 ^ 2\n");
        let NodeKind::Assignment { value, .. } = ast.kind(ast.statements()[0]) else {
            panic!("expected assignment");
        };
        let NodeKind::Unary { op: UnaryOp::Neg, operand } = ast.kind(*value) else {
            panic!("expected negation at the root");
        };
        let NodeKind::Binary { op: BinaryOp::Pow, lhs, rhs } = ast.kind(*operand) else {
            panic!("expected power");
        };
        assert!(matches!(ast.kind(*lhs), NodeKind::Literal(Literal::Int(n)) if n == "2"));
        assert!(matches!(ast.kind(*rhs), NodeKind::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_blank_lines_and_comments() {
        let ast = parse("# header\n\nint x = 1  # trailing\n\n\nprint(x)\n");
        assert_eq!(ast.statements().len(), 2);
    }

    #[test]
    fn test_empty_program() {
        let ast = parse("");
        assert!(ast.statements().is_empty());
    }

    #[test]
    fn test_missing_identifier_is_syntax_error() {
        let err = parse_err("int = 5");
        match err {
            AnalysisError::Syntax { expected, found, span } => {
                assert_eq!(expected, "identifier");
                assert_eq!(found, "'='");
                assert_eq!((span.line, span.column), (1, 5));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_chained_comparison_is_rejected() {
        let err = parse_err("x = a < b < c\n");
        assert!(matches!(err, AnalysisError::Syntax { ref found, .. } if found == "'<'"));
    }

    #[test]
    fn test_block_requires_indent() {
        let err = parse_err("if a:\nb = 1\n");
        assert!(matches!(err, AnalysisError::Syntax { ref expected, .. } if expected == "indent"));
    }

    #[test]
    fn test_stray_elif_is_rejected() {
        let err = parse_err("elif a:\n  b = 1\n");
        assert!(matches!(err, AnalysisError::Syntax { ref expected, .. } if expected == "statement"));
    }

    fn nesting_error(err: &AnalysisError) -> bool {
        matches!(err, AnalysisError::Syntax { expected, .. } if expected.starts_with("at most"))
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let depth = 5000;
        let source = format!("int x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
        let err = parse_err(&source);
        assert!(nesting_error(&err), "{err:?}");
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_deep_prefix_operators_are_rejected() {
        assert!(nesting_error(&parse_err(&format!("x = {}a\n", "not ".repeat(5000)))));
        assert!(nesting_error(&parse_err(&format!("x = {}1\n", "-".repeat(5000)))));
        assert!(nesting_error(&parse_err(&format!("x = 2{}\n", " ^ 2".repeat(5000)))));
    }

    #[test]
    fn test_deep_blocks_are_rejected() {
        let source: String = (0..200)
            .map(|level| format!("{}if a:\n", " ".repeat(level)))
            .chain(std::iter::once(format!("{}b = 1\n", " ".repeat(200))))
            .collect();
        let err = parse_err(&source);
        assert!(nesting_error(&err), "{err:?}");
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let parens = format!("int x = {}1{}\n", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&parens).statements().len(), 1);

        let blocks: String = (0..40)
            .map(|level| format!("{}if a:\n", " ".repeat(level)))
            .chain(std::iter::once(format!("{}b = 1\n", " ".repeat(40))))
            .collect();
        assert_eq!(parse(&blocks).statements().len(), 1);
    }

    #[test]
    fn test_lexical_errors_propagate() {
        let err = parse_err("int x = 1\nx = x $ 2\n");
        assert!(err.is_lexical());
        assert_eq!((err.line(), err.column()), (2, 7));
    }
}
