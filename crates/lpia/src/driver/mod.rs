//! Analysis driver and pipeline orchestration

use crate::common::AnalysisResult;
use crate::optimize::{self, OptimizerConfig};
use crate::parser::Parser;
use crate::report::AnalysisReport;
use crate::sema::SemanticAnalyzer;
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Analysis settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub optimizations: OptimizerConfig,
}

/// Runs the whole pipeline on one source text
///
/// Every call builds its own tree and tables, so one analyzer can be
/// shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Lex, parse and analyze `source`
    ///
    /// A lexical or syntax error is the only result in that case; semantic
    /// findings never fail the run.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
    pub fn analyze(&self, source: &str) -> AnalysisResult<AnalysisReport> {
        let ast = Parser::new(source)?.parse()?;
        debug!(nodes = ast.len(), statements = ast.statements().len(), "parsed");
        trace!(?ast);

        let model = SemanticAnalyzer::new(&ast).analyze();
        debug!(
            symbols = model.table.len(),
            findings = model.diagnostics.len(),
            "resolved scopes"
        );

        let statistics = Statistics::collect(&ast, &model.table);
        let suggestions = optimize::suggest(&ast, &self.config.optimizations);
        debug!(suggestions = suggestions.len(), "checked if chains");

        Ok(AnalysisReport::assemble(&model, statistics, suggestions))
    }
}

/// Analyze with the default configuration
pub fn analyze(source: &str) -> AnalysisResult<AnalysisReport> {
    Analyzer::new().analyze(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AnalysisError;

    #[test]
    fn test_analyze_reports_everything() {
        let report = analyze("int x = read()\nif x > 0:\n  print(x)\nelif x > 0:\n  print(0)\n").unwrap();
        assert_eq!(report.symbols.len(), 1);
        assert_eq!(report.statistics.conditionals, 2);
        assert_eq!(report.optimization_suggestions.len(), 1);
    }

    #[test]
    fn test_config_disables_suggestions() {
        let config = AnalyzerConfig {
            optimizations: OptimizerConfig::disabled(),
        };
        let report = Analyzer::with_config(config)
            .analyze("if a:\n  x = 1\nelif a:\n  x = 2\n")
            .unwrap();
        assert!(report.optimization_suggestions.is_empty());
        assert_eq!(report.undeclared.len(), 4);
    }

    #[test]
    fn test_syntax_error_is_the_only_result() {
        let err = analyze("int = 5").unwrap_err();
        assert!(matches!(err, AnalysisError::Syntax { .. }));
        assert_eq!((err.line(), err.column()), (1, 5));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let source = "int a\nint b = a\nfor i in [a, b]:\n  if i:\n    b = i\n";
        let analyzer = Analyzer::new();
        assert_eq!(analyzer.analyze(source).unwrap(), analyzer.analyze(source).unwrap());
    }
}
