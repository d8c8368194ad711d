//! Common infrastructure shared by every analysis stage

mod error;
mod span;

pub use error::{AnalysisError, AnalysisResult, DiagnosticReporter};
pub use span::{LineIndex, Span};
