//! LPI Analyzer - semantic analysis for the LPI teaching language
//!
//! This library reads LPI source text and reports what it finds: a scoped
//! symbol table, redeclared/undeclared/unused/uninitialized findings,
//! instruction counts and suggestions for simplifying `if` chains.
//!
//! ## Architecture
//!
//! The analyzer is organized into:
//! - **Lexer** (`lexer/`): logos tokens plus the indentation layout pass
//! - **AST** (`ast/`): arena syntax tree
//! - **Parser** (`parser/`): recursive descent, stops at the first error
//! - **Sema** (`sema/`): scopes, symbols and findings
//! - **Stats** (`stats/`): instruction and type counters
//! - **Optimize** (`optimize/`): if-chain suggestions
//! - **Report** (`report/`): the assembled result and its text view
//! - **Driver** (`driver/`): pipeline orchestration
//! - **Common** (`common/`): shared infrastructure (errors, spans)

pub mod ast;
pub mod common;
pub mod driver;
pub mod lexer;
pub mod optimize;
pub mod parser;
pub mod report;
pub mod sema;
pub mod stats;

// Re-exports for convenience
pub use common::{AnalysisError, AnalysisResult, DiagnosticReporter, Span};
pub use driver::{analyze, Analyzer, AnalyzerConfig};
pub use optimize::{OptimizationSuggestion, OptimizerConfig, SuggestionKind};
pub use report::{AnalysisReport, ReportParseError, SymbolEntry, UndeclaredName};
pub use stats::Statistics;
