//! Recursive descent parser producing the arena [`Ast`](crate::ast::Ast)

mod parser;

pub use parser::Parser;
