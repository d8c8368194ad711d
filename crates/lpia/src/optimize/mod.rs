//! If-chain simplification suggestions
//!
//! Every `if` chain in the program, at any depth, is checked against three
//! rules:
//! - `duplicate-condition`: a branch repeats an earlier test of the same
//!   chain and can never run;
//! - `nested-if`: the final branch of a chain without `else` holds nothing
//!   but a bare `if`, so the two tests can be joined with `and`;
//! - `else-if`: an `else` holds nothing but another chain and can become
//!   `elif`.

use crate::ast::{render_expr, render_operand, Ast, NodeId, NodeKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Which rules run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerConfig {
    pub duplicate_conditions: bool,
    pub nested_ifs: bool,
    pub else_ifs: bool,
}

impl OptimizerConfig {
    /// Every rule switched off
    pub fn disabled() -> Self {
        Self {
            duplicate_conditions: false,
            nested_ifs: false,
            else_ifs: false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.duplicate_conditions || self.nested_ifs || self.else_ifs
    }

    pub fn is_enabled(&self, kind: SuggestionKind) -> bool {
        match kind {
            SuggestionKind::DuplicateCondition => self.duplicate_conditions,
            SuggestionKind::NestedIf => self.nested_ifs,
            SuggestionKind::ElseIf => self.else_ifs,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            duplicate_conditions: true,
            nested_ifs: true,
            else_ifs: true,
        }
    }
}

/// Rule that produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    DuplicateCondition,
    NestedIf,
    ElseIf,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::DuplicateCondition => "duplicate-condition",
            SuggestionKind::NestedIf => "nested-if",
            SuggestionKind::ElseIf => "else-if",
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duplicate-condition" => Ok(SuggestionKind::DuplicateCondition),
            "nested-if" => Ok(SuggestionKind::NestedIf),
            "else-if" => Ok(SuggestionKind::ElseIf),
            other => Err(format!("unknown suggestion kind '{other}'")),
        }
    }
}

/// A proposed rewrite of one `if` chain
///
/// The text form is `[kind] line L, column C: message`; it is also how a
/// suggestion serializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationSuggestion {
    pub kind: SuggestionKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for OptimizationSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] line {}, column {}: {}",
            self.kind.as_str(),
            self.line,
            self.column,
            self.message
        )
    }
}

impl FromStr for OptimizationSuggestion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || format!("malformed suggestion '{s}'");

        let rest = s.strip_prefix('[').ok_or_else(malformed)?;
        let (kind, rest) = rest.split_once("] line ").ok_or_else(malformed)?;
        let (line, rest) = rest.split_once(", column ").ok_or_else(malformed)?;
        let (column, message) = rest.split_once(": ").ok_or_else(malformed)?;

        Ok(Self {
            kind: kind.parse()?,
            message: message.to_string(),
            line: line.parse().map_err(|_| malformed())?,
            column: column.parse().map_err(|_| malformed())?,
        })
    }
}

impl Serialize for OptimizationSuggestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OptimizationSuggestion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Collect suggestions for every `if` chain, ordered by position
pub fn suggest(ast: &Ast, config: &OptimizerConfig) -> Vec<OptimizationSuggestion> {
    let mut analyzer = IfChainAnalyzer {
        ast,
        config,
        suggestions: Vec::new(),
    };
    if config.any_enabled() {
        analyzer.visit_statements(ast.statements());
    }

    let mut suggestions = analyzer.suggestions;
    suggestions.sort_by_key(|s| (s.line, s.column));
    suggestions
}

struct IfChainAnalyzer<'a> {
    ast: &'a Ast,
    config: &'a OptimizerConfig,
    suggestions: Vec<OptimizationSuggestion>,
}

/// One test-carrying branch of a chain
struct Branch {
    keyword: &'static str,
    condition: NodeId,
    body: NodeId,
    node: NodeId,
}

impl IfChainAnalyzer<'_> {
    fn visit_statements(&mut self, statements: &[NodeId]) {
        for &stmt in statements {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::If { .. } => {
                self.check_chain(id);
                for body in self.chain_bodies(id) {
                    self.visit_statements(ast.block(body));
                }
            }
            NodeKind::ForLoop { body, .. } | NodeKind::DoWhileLoop { body, .. } => {
                self.visit_statements(ast.block(*body));
            }
            _ => {}
        }
    }

    fn chain_bodies(&self, id: NodeId) -> Vec<NodeId> {
        let mut bodies: Vec<NodeId> = self.branches(id).iter().map(|b| b.body).collect();
        if let Some(else_body) = self.else_body(id) {
            bodies.push(else_body);
        }
        bodies
    }

    fn branches(&self, id: NodeId) -> Vec<Branch> {
        let NodeKind::If { condition, body, elifs, .. } = self.ast.kind(id) else {
            return Vec::new();
        };

        let mut branches = vec![Branch {
            keyword: "if",
            condition: *condition,
            body: *body,
            node: id,
        }];
        for &elif in elifs {
            if let NodeKind::Elif { condition, body } = self.ast.kind(elif) {
                branches.push(Branch {
                    keyword: "elif",
                    condition: *condition,
                    body: *body,
                    node: elif,
                });
            }
        }
        branches
    }

    fn else_node(&self, id: NodeId) -> Option<NodeId> {
        match self.ast.kind(id) {
            NodeKind::If { else_branch, .. } => *else_branch,
            _ => None,
        }
    }

    fn else_body(&self, id: NodeId) -> Option<NodeId> {
        match self.ast.kind(self.else_node(id)?) {
            NodeKind::Else { body } => Some(*body),
            _ => None,
        }
    }

    /// The statement of a block holding exactly one statement
    fn sole_statement(&self, block: NodeId) -> Option<NodeId> {
        match self.ast.block(block) {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn check_chain(&mut self, id: NodeId) {
        let branches = self.branches(id);

        if self.config.is_enabled(SuggestionKind::DuplicateCondition) {
            self.check_duplicates(&branches);
        }

        if self.config.is_enabled(SuggestionKind::NestedIf) && self.else_node(id).is_none() {
            if let Some(last) = branches.last() {
                self.check_nested_if(last);
            }
        }

        if self.config.is_enabled(SuggestionKind::ElseIf) {
            self.check_else_if(id);
        }
    }

    fn check_duplicates(&mut self, branches: &[Branch]) {
        for (i, branch) in branches.iter().enumerate() {
            let earlier = branches[..i]
                .iter()
                .find(|other| self.ast.same_structure(other.condition, branch.condition));
            if let Some(earlier) = earlier {
                let span = self.ast.span(branch.node);
                let message = format!(
                    "condition `{}` repeats the test on line {}; this `{}` branch can never run",
                    render_expr(self.ast, branch.condition),
                    self.ast.span(earlier.node).line,
                    branch.keyword,
                );
                self.push(SuggestionKind::DuplicateCondition, message, span.line, span.column);
            }
        }
    }

    fn check_nested_if(&mut self, branch: &Branch) {
        let Some(inner) = self.sole_statement(branch.body) else {
            return;
        };
        let NodeKind::If { condition, elifs, else_branch, .. } = self.ast.kind(inner) else {
            return;
        };
        if !elifs.is_empty() || else_branch.is_some() {
            return;
        }

        // `and` is left-associative at precedence 2
        let merged = format!(
            "{} and {}",
            render_operand(self.ast, branch.condition, 2),
            render_operand(self.ast, *condition, 3),
        );
        let span = self.ast.span(branch.node);
        let message = format!(
            "`{kw} {}:` containing only `if {}:` can be written as `{kw} {merged}:`",
            render_expr(self.ast, branch.condition),
            render_expr(self.ast, *condition),
            kw = branch.keyword,
        );
        self.push(SuggestionKind::NestedIf, message, span.line, span.column);
    }

    fn check_else_if(&mut self, id: NodeId) {
        let (Some(else_id), Some(body)) = (self.else_node(id), self.else_body(id)) else {
            return;
        };
        let Some(inner) = self.sole_statement(body) else {
            return;
        };
        let NodeKind::If { condition, .. } = self.ast.kind(inner) else {
            return;
        };

        let condition = render_expr(self.ast, *condition);
        let span = self.ast.span(else_id);
        let message = format!("`else:` containing only `if {condition}:` can be written as `elif {condition}:`");
        self.push(SuggestionKind::ElseIf, message, span.line, span.column);
    }

    fn push(&mut self, kind: SuggestionKind, message: String, line: u32, column: u32) {
        self.suggestions.push(OptimizationSuggestion { kind, message, line, column });
    }
}
