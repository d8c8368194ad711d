//! The analysis report handed to callers
//!
//! [`AnalysisReport`] is the canonical result. It serializes with serde
//! (camelCase keys) and has a plain-text view, see [`text`].

pub mod text;

pub use text::ReportParseError;

use crate::optimize::OptimizationSuggestion;
use crate::sema::{DiagnosticKind, SemanticModel, Subject, SymbolId, SymbolTable};
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};

/// One symbol, or a snapshot of one taken at a finding's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub scope: String,
    pub initialized: bool,
    pub used: bool,
    pub redeclared: bool,
    pub line: u32,
    pub column: u32,
}

impl SymbolEntry {
    fn from_table(table: &SymbolTable, id: SymbolId) -> Self {
        let symbol = table.symbol(id);
        Self {
            name: symbol.name.clone(),
            ty: symbol.ty.to_string(),
            scope: table.scope_label(symbol.scope),
            initialized: symbol.initialized,
            used: symbol.used,
            redeclared: symbol.redeclared,
            line: symbol.line,
            column: symbol.column,
        }
    }

    /// Same symbol, reported at another position
    pub fn at(&self, line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            ..self.clone()
        }
    }
}

/// A read or assignment of a name no enclosing scope declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndeclaredName {
    pub name: String,
    pub line: u32,
    pub column: u32,
}

/// Everything the analyzer found in one program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Every symbol in declaration order
    pub symbols: Vec<SymbolEntry>,
    /// Snapshots at each redeclaration site
    pub redeclared: Vec<SymbolEntry>,
    pub undeclared: Vec<UndeclaredName>,
    /// Snapshots at the declaration site
    pub unused: Vec<SymbolEntry>,
    /// Snapshots at each offending read
    pub used_before_init: Vec<SymbolEntry>,
    #[serde(flatten)]
    pub statistics: Statistics,
    pub optimization_suggestions: Vec<OptimizationSuggestion>,
}

impl AnalysisReport {
    /// Merge the outputs of the individual passes
    pub fn assemble(
        model: &SemanticModel,
        statistics: Statistics,
        optimization_suggestions: Vec<OptimizationSuggestion>,
    ) -> Self {
        let table = &model.table;
        let mut report = Self {
            symbols: table
                .symbols()
                .map(|(id, _)| SymbolEntry::from_table(table, id))
                .collect(),
            statistics,
            optimization_suggestions,
            ..Self::default()
        };

        for diagnostic in &model.diagnostics {
            let (line, column) = (diagnostic.line, diagnostic.column);
            let snapshot = || match diagnostic.subject {
                Subject::Symbol(id) => Some(SymbolEntry::from_table(table, id).at(line, column)),
                Subject::Name(_) => None,
            };

            match diagnostic.kind {
                DiagnosticKind::Undeclared => report.undeclared.push(UndeclaredName {
                    name: diagnostic.name(table).to_string(),
                    line,
                    column,
                }),
                DiagnosticKind::Redeclared => report.redeclared.extend(snapshot()),
                DiagnosticKind::Unused => report.unused.extend(snapshot()),
                DiagnosticKind::UsedBeforeInit => report.used_before_init.extend(snapshot()),
            }
        }

        report
    }

    /// Number of semantic findings of all four kinds
    pub fn finding_count(&self) -> usize {
        self.redeclared.len() + self.undeclared.len() + self.unused.len() + self.used_before_init.len()
    }

    /// Look up a symbol by name and scope label
    pub fn symbol(&self, name: &str, scope: &str) -> Option<&SymbolEntry> {
        self.symbols.iter().find(|s| s.name == name && s.scope == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::analyze;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshots_use_finding_positions() {
        let report = analyze("int x\nprint(x)\nint x = 2\n").unwrap();

        let x = SymbolEntry {
            name: "x".to_string(),
            ty: "int".to_string(),
            scope: "global".to_string(),
            initialized: false,
            used: true,
            redeclared: true,
            line: 1,
            column: 5,
        };
        assert_eq!(report.symbols, vec![x.clone()]);
        assert_eq!(report.redeclared, vec![x.at(3, 5)]);
        assert_eq!(report.used_before_init, vec![x.at(2, 7)]);
        assert!(report.unused.is_empty());
        assert_eq!(report.statistics.declarations, 2);
        assert_eq!(report.finding_count(), 2);
    }

    #[test]
    fn test_json_shape() {
        let report = analyze("int a\nprint(b)\n").unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["symbols"][0]["type"], "int");
        assert_eq!(json["symbols"][0]["scope"], "global");
        assert_eq!(json["undeclared"][0]["name"], "b");
        assert_eq!(json["unused"][0]["line"], 1);
        assert_eq!(json["usedBeforeInit"], serde_json::json!([]));
        assert_eq!(json["typeCounts"]["int"], 1);
        assert_eq!(json["readWrite"], 1);
        assert_eq!(json["nestings"], 0);
        assert_eq!(json["optimizationSuggestions"], serde_json::json!([]));
    }

    #[test]
    fn test_json_round_trip() {
        let report = analyze("int a = 1\nif a:\n  x = 1\nelif a:\n  print(a)\n").unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
