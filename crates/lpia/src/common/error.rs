//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use std::ops::Range;
use thiserror::Error;
use super::Span;
use crate::report::{AnalysisReport, SymbolEntry};

/// Fatal analysis error with source location
///
/// Any of these aborts the run: no partial tree and no partial report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("lexical error at {span}: unexpected character {character:?}")]
    UnexpectedCharacter { character: char, span: Span },

    #[error("indentation error at {span}: {message}")]
    Indentation { message: String, span: Span },

    #[error("syntax error at {span}: expected {expected}, found {found}")]
    Syntax { expected: String, found: String, span: Span },
}

impl AnalysisError {
    pub fn unexpected_character(character: char, span: Span) -> Self {
        Self::UnexpectedCharacter { character, span }
    }

    pub fn indentation(message: impl Into<String>, span: Span) -> Self {
        Self::Indentation {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedCharacter { span, .. }
            | Self::Indentation { span, .. }
            | Self::Syntax { span, .. } => *span,
        }
    }

    pub fn line(&self) -> u32 {
        self.span().line
    }

    pub fn column(&self) -> u32 {
        self.span().column
    }

    /// True for errors raised while tokenizing
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::UnexpectedCharacter { .. } | Self::Indentation { .. })
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Build the diagnostic for a fatal error
    pub fn error_diagnostic(&self, file_id: usize, error: &AnalysisError) -> Diagnostic<usize> {
        match error {
            AnalysisError::UnexpectedCharacter { character, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end)
                        .with_message(format!("unexpected character {character:?}")),
                ]),

            AnalysisError::Indentation { message, span } => Diagnostic::error()
                .with_message("Indentation error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            AnalysisError::Syntax { expected, found, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end)
                        .with_message(format!("expected {expected}, found {found}")),
                ]),
        }
    }

    /// Build one diagnostic per finding in the report
    ///
    /// Redeclared and undeclared names are errors, unused and
    /// uninitialized reads are warnings, if-chain suggestions are help.
    pub fn finding_diagnostics(&self, file_id: usize, report: &AnalysisReport) -> Vec<Diagnostic<usize>> {
        let mut diagnostics = Vec::new();

        for entry in &report.redeclared {
            diagnostics.push(self.symbol_diagnostic(
                Diagnostic::error(),
                file_id,
                entry,
                format!("'{}' is already declared in this scope", entry.name),
                "redeclared here",
            ));
        }

        for name in &report.undeclared {
            let mut diagnostic = Diagnostic::error()
                .with_message(format!("'{}' is not declared", name.name));
            if let Some(range) = self.byte_range(file_id, name.line, name.column, name.name.len()) {
                diagnostic = diagnostic.with_labels(vec![
                    Label::primary(file_id, range).with_message("not found in any enclosing scope"),
                ]);
            }
            diagnostics.push(diagnostic);
        }

        for entry in &report.unused {
            diagnostics.push(self.symbol_diagnostic(
                Diagnostic::warning(),
                file_id,
                entry,
                format!("'{}' is never read", entry.name),
                "declared here",
            ));
        }

        for entry in &report.used_before_init {
            diagnostics.push(self.symbol_diagnostic(
                Diagnostic::warning(),
                file_id,
                entry,
                format!("'{}' is read before it is initialized", entry.name),
                "read here",
            ));
        }

        for suggestion in &report.optimization_suggestions {
            let mut diagnostic = Diagnostic::help().with_message(suggestion.message.clone());
            if let Some(range) = self.byte_range(file_id, suggestion.line, suggestion.column, 1) {
                diagnostic = diagnostic.with_labels(vec![
                    Label::primary(file_id, range).with_message(suggestion.kind.as_str()),
                ]);
            }
            diagnostics.push(diagnostic);
        }

        diagnostics
    }

    fn symbol_diagnostic(
        &self,
        diagnostic: Diagnostic<usize>,
        file_id: usize,
        entry: &SymbolEntry,
        message: String,
        label: &str,
    ) -> Diagnostic<usize> {
        let diagnostic = diagnostic
            .with_message(message)
            .with_notes(vec![format!("{}: {} (scope {})", entry.name, entry.ty, entry.scope)]);
        match self.byte_range(file_id, entry.line, entry.column, entry.name.len()) {
            Some(range) => diagnostic.with_labels(vec![
                Label::primary(file_id, range).with_message(label.to_string()),
            ]),
            None => diagnostic,
        }
    }

    /// Byte range starting at a 1-based line/column, clamped to that line
    fn byte_range(&self, file_id: usize, line: u32, column: u32, len: usize) -> Option<Range<usize>> {
        let line_range = self.files.line_range(file_id, (line as usize).checked_sub(1)?).ok()?;
        let source = self.files.source(file_id).ok()?;
        let text = &source[line_range.clone()];
        let skip = (column as usize).checked_sub(1)?;
        let start = line_range.start
            + text.char_indices().nth(skip).map_or(text.len(), |(i, _)| i);
        Some(start..(start + len).min(line_range.end))
    }

    /// Render diagnostics into any colour-capable writer
    pub fn emit_to(&self, writer: &mut dyn WriteColor, diagnostics: &[Diagnostic<usize>]) {
        for diagnostic in diagnostics {
            let _ = term::emit(writer, &self.config, &self.files, diagnostic);
        }
    }

    pub fn report_error(&self, file_id: usize, error: &AnalysisError) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer.lock(), &[self.error_diagnostic(file_id, error)]);
    }

    pub fn report_findings(&self, file_id: usize, report: &AnalysisReport) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer.lock(), &self.finding_diagnostics(file_id, report));
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
