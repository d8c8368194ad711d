//! Abstract Syntax Tree definitions
//!
//! The tree lives in an arena: nodes refer to their children by
//! [`NodeId`], so later passes can borrow the whole [`Ast`] and jump
//! between nodes without lifetime entanglement.

mod expr;
mod render;
mod types;

pub use expr::*;
pub use render::render_expr;
pub(crate) use render::render_operand;
pub use types::*;

use crate::common::Span;

/// Index of a node in its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Syntax tree node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Node kinds
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Whole source file
    Program(Vec<NodeId>),

    /// Declaration: int x [= expr]
    Declaration {
        ty: TypeName,
        name: String,
        name_span: Span,
        init: Option<NodeId>,
    },

    /// Assignment: x = expr
    Assignment {
        target: String,
        target_span: Span,
        value: NodeId,
    },

    /// For loop: for n in expr: block
    ForLoop {
        var: String,
        var_span: Span,
        iterable: NodeId,
        body: NodeId,
    },

    /// Do-while loop: do: block while (expr)
    DoWhileLoop { body: NodeId, condition: NodeId },

    /// If chain head: if expr: block, with its `Elif` and `Else` nodes
    If {
        condition: NodeId,
        body: NodeId,
        elifs: Vec<NodeId>,
        else_branch: Option<NodeId>,
    },

    /// elif expr: block
    Elif { condition: NodeId, body: NodeId },

    /// else: block
    Else { body: NodeId },

    /// Call: name(args)
    Call { callee: String, args: Vec<NodeId> },

    /// Binary operation: a + b
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },

    /// Unary operation: -x, not x
    Unary { op: UnaryOp, operand: NodeId },

    /// Identifier in a read position
    Identifier(String),

    /// Literal value
    Literal(Literal),

    /// List literal: [a, b]
    ListLiteral(Vec<NodeId>),

    /// Indented statement block
    Block(Vec<NodeId>),
}

/// Complete syntax tree for one source file
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level statements
    pub fn statements(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Program(body) => body,
            _ => &[],
        }
    }

    /// Statements of a `Block` node (empty for anything else)
    pub fn block(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Block(body) => body,
            _ => &[],
        }
    }

    /// Compare two subtrees, ignoring positions
    pub fn same_structure(&self, a: NodeId, b: NodeId) -> bool {
        use NodeKind as K;

        let all_same = |xs: &[NodeId], ys: &[NodeId]| {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.same_structure(*x, *y))
        };

        match (self.kind(a), self.kind(b)) {
            (K::Identifier(x), K::Identifier(y)) => x == y,
            (K::Literal(x), K::Literal(y)) => x == y,
            (K::ListLiteral(xs), K::ListLiteral(ys))
            | (K::Block(xs), K::Block(ys))
            | (K::Program(xs), K::Program(ys)) => all_same(xs, ys),
            (K::Binary { op: o1, lhs: l1, rhs: r1 }, K::Binary { op: o2, lhs: l2, rhs: r2 }) => {
                o1 == o2 && self.same_structure(*l1, *l2) && self.same_structure(*r1, *r2)
            }
            (K::Unary { op: o1, operand: x }, K::Unary { op: o2, operand: y }) => {
                o1 == o2 && self.same_structure(*x, *y)
            }
            (K::Call { callee: c1, args: a1 }, K::Call { callee: c2, args: a2 }) => {
                c1 == c2 && all_same(a1, a2)
            }
            (
                K::Declaration { ty: t1, name: n1, init: i1, .. },
                K::Declaration { ty: t2, name: n2, init: i2, .. },
            ) => t1 == t2 && n1 == n2 && self.same_optional(*i1, *i2),
            (
                K::Assignment { target: t1, value: v1, .. },
                K::Assignment { target: t2, value: v2, .. },
            ) => t1 == t2 && self.same_structure(*v1, *v2),
            (
                K::ForLoop { var: v1, iterable: i1, body: b1, .. },
                K::ForLoop { var: v2, iterable: i2, body: b2, .. },
            ) => v1 == v2 && self.same_structure(*i1, *i2) && self.same_structure(*b1, *b2),
            (K::DoWhileLoop { body: b1, condition: c1 }, K::DoWhileLoop { body: b2, condition: c2 })
            | (K::Elif { condition: c1, body: b1 }, K::Elif { condition: c2, body: b2 }) => {
                self.same_structure(*b1, *b2) && self.same_structure(*c1, *c2)
            }
            (K::Else { body: b1 }, K::Else { body: b2 }) => self.same_structure(*b1, *b2),
            (
                K::If { condition: c1, body: b1, elifs: e1, else_branch: x1 },
                K::If { condition: c2, body: b2, elifs: e2, else_branch: x2 },
            ) => {
                self.same_structure(*c1, *c2)
                    && self.same_structure(*b1, *b2)
                    && all_same(e1, e2)
                    && self.same_optional(*x1, *x2)
            }
            _ => false,
        }
    }

    fn same_optional(&self, a: Option<NodeId>, b: Option<NodeId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.same_structure(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Append-only node storage used while parsing
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node::new(kind, span));
        NodeId(self.nodes.len() - 1)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast { nodes: self.nodes, root }
    }
}
