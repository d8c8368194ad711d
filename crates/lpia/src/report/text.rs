//! Plain-text view of a report
//!
//! This is the layout older callers scrape:
//!
//! ```text
//! tabela de simbolos:
//!
//! Nome: x, Tipo: int, Escopo: global, Inicializado: False, Usado: True, Redeclarado: True, Linha: 1, Coluna: 5
//! === Análise ===
//! Variáveis redeclaradas:
//!   x (linha 3, coluna 5, escopo global)
//! Variáveis não declaradas:
//! Variáveis não usadas:
//! Variáveis usadas sem inicialização:
//!   x (linha 2, coluna 7, escopo global)
//! Contagem por tipo:
//!   int: 1
//! ----------------------------------
//!
//! === Instruction Counts ===
//!   Declarations: 2
//!   ...
//!   Aninhamentos: 0
//!   Ifs simplificavel: 0
//! Sugestões de otimização:
//! ```
//!
//! Finding lines carry the scope label, so each snapshot can be matched
//! back to its symbol and the text parses back into an identical report.

use super::{AnalysisReport, SymbolEntry, UndeclaredName};
use crate::optimize::OptimizationSuggestion;
use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::{FromStr, Lines};
use thiserror::Error;

const SYMBOLS_HEADER: &str = "tabela de simbolos:";
const ANALYSIS_HEADER: &str = "=== Análise ===";
const REDECLARED_HEADER: &str = "Variáveis redeclaradas:";
const UNDECLARED_HEADER: &str = "Variáveis não declaradas:";
const UNUSED_HEADER: &str = "Variáveis não usadas:";
const UNINITIALIZED_HEADER: &str = "Variáveis usadas sem inicialização:";
const TYPE_COUNTS_HEADER: &str = "Contagem por tipo:";
const RULE: &str = "----------------------------------";
const COUNTS_HEADER: &str = "=== Instruction Counts ===";
const SUGGESTIONS_HEADER: &str = "Sugestões de otimização:";
const INDENT: &str = "  ";

/// Text that does not follow the report layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("report line {line}: {message}")]
pub struct ReportParseError {
    /// 1-based line of the offending text (one past the end for truncation)
    pub line: usize,
    pub message: String,
}

impl ReportParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SYMBOLS_HEADER}")?;
        writeln!(f)?;
        for s in &self.symbols {
            writeln!(
                f,
                "Nome: {}, Tipo: {}, Escopo: {}, Inicializado: {}, Usado: {}, Redeclarado: {}, Linha: {}, Coluna: {}",
                s.name,
                s.ty,
                s.scope,
                flag(s.initialized),
                flag(s.used),
                flag(s.redeclared),
                s.line,
                s.column
            )?;
        }

        writeln!(f, "{ANALYSIS_HEADER}")?;
        write_snapshots(f, REDECLARED_HEADER, &self.redeclared)?;
        writeln!(f, "{UNDECLARED_HEADER}")?;
        for u in &self.undeclared {
            writeln!(f, "{INDENT}{} (linha {}, coluna {})", u.name, u.line, u.column)?;
        }
        write_snapshots(f, UNUSED_HEADER, &self.unused)?;
        write_snapshots(f, UNINITIALIZED_HEADER, &self.used_before_init)?;

        writeln!(f, "{TYPE_COUNTS_HEADER}")?;
        for (ty, count) in &self.statistics.type_counts {
            writeln!(f, "{INDENT}{ty}: {count}")?;
        }
        writeln!(f, "{RULE}")?;

        let stats = &self.statistics;
        writeln!(f)?;
        writeln!(f, "{COUNTS_HEADER}")?;
        writeln!(f, "{INDENT}Declarations: {}", stats.declarations)?;
        writeln!(f, "{INDENT}Assignments: {}", stats.assignments)?;
        writeln!(f, "{INDENT}Read/Write: {}", stats.read_write)?;
        writeln!(f, "{INDENT}Conditionals: {}", stats.conditionals)?;
        writeln!(f, "{INDENT}Cyclic: {}", stats.cyclic)?;
        writeln!(f, "{INDENT}Aninhamentos: {}", stats.nestings)?;
        writeln!(f, "{INDENT}Ifs simplificavel: {}", self.optimization_suggestions.len())?;

        writeln!(f, "{SUGGESTIONS_HEADER}")?;
        for suggestion in &self.optimization_suggestions {
            writeln!(f, "{INDENT}{suggestion}")?;
        }
        Ok(())
    }
}

fn write_snapshots(f: &mut fmt::Formatter<'_>, header: &str, entries: &[SymbolEntry]) -> fmt::Result {
    writeln!(f, "{header}")?;
    for e in entries {
        writeln!(
            f,
            "{INDENT}{} (linha {}, coluna {}, escopo {})",
            e.name, e.line, e.column, e.scope
        )?;
    }
    Ok(())
}

impl FromStr for AnalysisReport {
    type Err = ReportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = Reader::new(s);
        let mut report = AnalysisReport::default();

        reader.expect(SYMBOLS_HEADER)?;
        reader.expect("")?;
        loop {
            let (line_no, line) = reader.next_line()?;
            if line == ANALYSIS_HEADER {
                break;
            }
            report.symbols.push(parse_symbol(line).map_err(|m| ReportParseError::new(line_no, m))?);
        }

        reader.expect(REDECLARED_HEADER)?;
        for (line_no, item) in reader.items() {
            let snapshot = resolve_snapshot(&report, line_no, item)?;
            report.redeclared.push(snapshot);
        }

        reader.expect(UNDECLARED_HEADER)?;
        for (line_no, item) in reader.items() {
            let (name, position) = split_finding(item)
                .ok_or_else(|| ReportParseError::new(line_no, "malformed undeclared name"))?;
            let [line, column] = parse_position(&position, line_no)?;
            report.undeclared.push(UndeclaredName {
                name: name.to_string(),
                line,
                column,
            });
        }

        reader.expect(UNUSED_HEADER)?;
        for (line_no, item) in reader.items() {
            let snapshot = resolve_snapshot(&report, line_no, item)?;
            report.unused.push(snapshot);
        }

        reader.expect(UNINITIALIZED_HEADER)?;
        for (line_no, item) in reader.items() {
            let snapshot = resolve_snapshot(&report, line_no, item)?;
            report.used_before_init.push(snapshot);
        }

        reader.expect(TYPE_COUNTS_HEADER)?;
        for (line_no, item) in reader.items() {
            let (ty, count) = item
                .rsplit_once(": ")
                .ok_or_else(|| ReportParseError::new(line_no, "malformed type count"))?;
            let count = parse_number(count, line_no)?;
            report.statistics.type_counts.insert(ty.to_string(), count);
        }

        reader.expect(RULE)?;
        reader.expect("")?;
        reader.expect(COUNTS_HEADER)?;
        let stats = &mut report.statistics;
        stats.declarations = reader.counter("Declarations")?;
        stats.assignments = reader.counter("Assignments")?;
        stats.read_write = reader.counter("Read/Write")?;
        stats.conditionals = reader.counter("Conditionals")?;
        stats.cyclic = reader.counter("Cyclic")?;
        stats.nestings = reader.counter("Aninhamentos")?;
        // derived from the suggestion list
        reader.counter("Ifs simplificavel")?;

        reader.expect(SUGGESTIONS_HEADER)?;
        for (line_no, item) in reader.items() {
            let suggestion: OptimizationSuggestion =
                item.parse().map_err(|m: String| ReportParseError::new(line_no, m))?;
            report.optimization_suggestions.push(suggestion);
        }

        reader.finish()?;
        Ok(report)
    }
}

/// Line cursor with 1-based numbering
struct Reader<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    count: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate().peekable(),
            count: text.lines().count(),
        }
    }

    fn next_line(&mut self) -> Result<(usize, &'a str), ReportParseError> {
        self.lines
            .next()
            .map(|(i, line)| (i + 1, line))
            .ok_or_else(|| ReportParseError::new(self.count + 1, "unexpected end of report"))
    }

    fn expect(&mut self, text: &str) -> Result<(), ReportParseError> {
        let (line_no, line) = self.next_line()?;
        if line == text {
            Ok(())
        } else {
            Err(ReportParseError::new(line_no, format!("expected {text:?}, found {line:?}")))
        }
    }

    /// Indented lines of the current section, without their indent
    fn items(&mut self) -> Vec<(usize, &'a str)> {
        let mut items = Vec::new();
        while let Some((i, item)) = self.lines.next_if(|(_, line)| line.starts_with(INDENT)) {
            items.push((i + 1, &item[INDENT.len()..]));
        }
        items
    }

    /// `  <label>: N`
    fn counter(&mut self, label: &str) -> Result<usize, ReportParseError> {
        let (line_no, line) = self.next_line()?;
        line.strip_prefix(INDENT)
            .and_then(|rest| rest.strip_prefix(label))
            .and_then(|rest| rest.strip_prefix(": "))
            .ok_or_else(|| ReportParseError::new(line_no, format!("expected counter {label:?}, found {line:?}")))
            .and_then(|value| parse_number(value, line_no))
    }

    /// Only blank lines may follow the last section
    fn finish(&mut self) -> Result<(), ReportParseError> {
        for (i, line) in self.lines.by_ref() {
            if !line.trim().is_empty() {
                return Err(ReportParseError::new(i + 1, format!("unexpected trailing text {line:?}")));
            }
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(text: &str, line_no: usize) -> Result<T, ReportParseError> {
    text.parse()
        .map_err(|_| ReportParseError::new(line_no, format!("expected a number, found {text:?}")))
}

fn parse_flag(text: &str) -> Result<bool, String> {
    match text {
        "True" => Ok(true),
        "False" => Ok(false),
        other => Err(format!("expected True or False, found {other:?}")),
    }
}

/// `Nome: x, Tipo: int, Escopo: global, ...`
fn parse_symbol(line: &str) -> Result<SymbolEntry, String> {
    const KEYS: [&str; 8] = [
        "Nome", "Tipo", "Escopo", "Inicializado", "Usado", "Redeclarado", "Linha", "Coluna",
    ];

    let fields: Vec<&str> = line.split(", ").collect();
    if fields.len() != KEYS.len() {
        return Err(format!("expected {} symbol fields, found {}", KEYS.len(), fields.len()));
    }

    let mut values = [""; 8];
    for ((field, key), value) in fields.iter().zip(KEYS).zip(values.iter_mut()) {
        *value = field
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(": "))
            .ok_or_else(|| format!("expected field {key:?}, found {field:?}"))?;
    }

    let number = |text: &str| text.parse::<u32>().map_err(|_| format!("expected a number, found {text:?}"));
    Ok(SymbolEntry {
        name: values[0].to_string(),
        ty: values[1].to_string(),
        scope: values[2].to_string(),
        initialized: parse_flag(values[3])?,
        used: parse_flag(values[4])?,
        redeclared: parse_flag(values[5])?,
        line: number(values[6])?,
        column: number(values[7])?,
    })
}

/// `x (linha 3, coluna 5, ...)` into the name and the parenthesized fields
fn split_finding(item: &str) -> Option<(&str, Vec<&str>)> {
    let (name, rest) = item.split_once(" (")?;
    let inner = rest.strip_suffix(')')?;
    Some((name, inner.split(", ").collect()))
}

fn parse_position(fields: &[&str], line_no: usize) -> Result<[u32; 2], ReportParseError> {
    let field = |index: usize, key: &str| -> Result<u32, ReportParseError> {
        let value = fields
            .get(index)
            .and_then(|f| f.strip_prefix(key))
            .ok_or_else(|| ReportParseError::new(line_no, format!("missing {key:?}")))?;
        parse_number(value, line_no)
    };
    Ok([field(0, "linha ")?, field(1, "coluna ")?])
}

/// Rebuild a snapshot from its finding line and the symbol it names
fn resolve_snapshot(report: &AnalysisReport, line_no: usize, item: &str) -> Result<SymbolEntry, ReportParseError> {
    let (name, fields) =
        split_finding(item).ok_or_else(|| ReportParseError::new(line_no, "malformed finding"))?;
    let [line, column] = parse_position(&fields, line_no)?;
    let scope = match fields.as_slice() {
        [_, _, scope] => scope
            .strip_prefix("escopo ")
            .ok_or_else(|| ReportParseError::new(line_no, "missing \"escopo \""))?,
        _ => return Err(ReportParseError::new(line_no, "expected line, column and scope")),
    };

    report
        .symbol(name, scope)
        .map(|symbol| symbol.at(line, column))
        .ok_or_else(|| ReportParseError::new(line_no, format!("no symbol '{name}' in scope {scope}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::analyze;
    use pretty_assertions::assert_eq;

    const PROGRAM: &str = "\
int x
print(x)
int x = 2
list[int] nums = [1, 2, 3]
for n in nums:
    n = n + 1
    y = n
if x > 1:
    if n:
        print(n)
elif x > 1:
    print(x)
";

    #[test]
    fn test_render_layout() {
        let report = analyze("int x\nprint(x)\nint x = 2\n").unwrap();
        let expected = "\
tabela de simbolos:

Nome: x, Tipo: int, Escopo: global, Inicializado: False, Usado: True, Redeclarado: True, Linha: 1, Coluna: 5
=== Análise ===
Variáveis redeclaradas:
  x (linha 3, coluna 5, escopo global)
Variáveis não declaradas:
Variáveis não usadas:
Variáveis usadas sem inicialização:
  x (linha 2, coluna 7, escopo global)
Contagem por tipo:
  int: 1
----------------------------------

=== Instruction Counts ===
  Declarations: 2
  Assignments: 0
  Read/Write: 1
  Conditionals: 0
  Cyclic: 0
  Aninhamentos: 0
  Ifs simplificavel: 0
Sugestões de otimização:
";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_round_trip() {
        let report = analyze(PROGRAM).unwrap();
        assert!(!report.undeclared.is_empty());
        assert!(!report.optimization_suggestions.is_empty());

        let parsed: AnalysisReport = report.to_string().parse().unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_round_trip_empty() {
        let report = analyze("").unwrap();
        let parsed: AnalysisReport = report.to_string().parse().unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_truncated_text() {
        let err = "tabela de simbolos:\n\n".parse::<AnalysisReport>().unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.message, "unexpected end of report");
    }

    #[test]
    fn test_unknown_symbol_in_finding() {
        let text = analyze("int a\n").unwrap().to_string().replace("  a (linha 1", "  b (linha 1");
        let err = text.parse::<AnalysisReport>().unwrap_err();
        assert_eq!(err.line, 8);
        assert!(err.message.contains("no symbol 'b'"));
    }

    #[test]
    fn test_bad_flag() {
        let text = analyze("int a\n").unwrap().to_string().replace("Usado: False", "Usado: maybe");
        let err = text.parse::<AnalysisReport>().unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_trailing_text_is_rejected() {
        let text = format!("{}\n\nleftover\n", analyze("").unwrap());
        let err = text.parse::<AnalysisReport>().unwrap_err();
        assert!(err.message.contains("leftover"));
    }
}
