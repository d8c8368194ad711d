//! LPI Analyzer - semantic report for LPI programs
//!
//! Usage: lpia [OPTIONS] <input>

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream};
use lpi_analyzer::common::{AnalysisError, DiagnosticReporter};
use lpi_analyzer::lexer::Lexer;
use lpi_analyzer::parser::Parser;
use lpi_analyzer::{Analyzer, AnalyzerConfig, AnalysisReport, OptimizerConfig};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, Level};

/// Report format
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Default)]
enum Format {
    /// Plain-text report
    #[default]
    Text,
    /// JSON object with camelCase keys
    Json,
    /// Annotated source snippets for every finding
    Diagnostics,
}

#[derive(ClapParser, Debug)]
#[command(name = "lpia")]
#[command(author = "LPI Analyzer Team")]
#[command(version)]
#[command(about = "Semantic analyzer for the LPI teaching language", long_about = None)]
struct Args {
    /// Input source file (.lpi), or - for standard input
    #[arg(required = true)]
    input: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Write the report to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Skip the if-chain suggestions
    #[arg(long)]
    no_optimizations: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_source(args: &Args) -> Result<(String, String)> {
    if args.input.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read standard input")?;
        return Ok(("<stdin>".to_string(), source));
    }

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    Ok((args.input.display().to_string(), source))
}

fn run(args: &Args) -> Result<()> {
    let (filename, source) = read_source(args)?;
    debug!(file = %filename, bytes = source.len(), "read source");

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);
    let fail = |e: AnalysisError| {
        reporter.report_error(file_id, &e);
        anyhow::Error::new(e).context(format!("cannot analyze {filename}"))
    };

    if args.dump_tokens {
        let tokens = Lexer::new(&source).tokenize_all().map_err(fail)?;
        eprintln!("=== LPI Tokens ===");
        for token in &tokens {
            eprintln!("{}: {}", token.span, token.kind);
        }
        eprintln!("=== End Tokens ===\n");
    }

    if args.dump_ast {
        let ast = Parser::new(&source).and_then(Parser::parse).map_err(fail)?;
        eprintln!("=== LPI AST ===");
        eprintln!("{ast:#?}");
        eprintln!("=== End AST ===\n");
    }

    let config = AnalyzerConfig {
        optimizations: if args.no_optimizations {
            OptimizerConfig::disabled()
        } else {
            OptimizerConfig::default()
        },
    };
    let report = Analyzer::with_config(config).analyze(&source).map_err(fail)?;
    debug!(findings = report.finding_count(), "analysis finished");

    match args.format {
        Format::Text => emit(args, report.to_string()),
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            emit(args, json + "\n")
        }
        Format::Diagnostics => emit_diagnostics(args, &reporter, file_id, &report),
    }
}

fn emit(args: &Args, text: String) -> Result<()> {
    match &args.output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            io::stdout().write_all(text.as_bytes()).context("failed to write report")
        }
    }
}

fn emit_diagnostics(
    args: &Args,
    reporter: &DiagnosticReporter,
    file_id: usize,
    report: &AnalysisReport,
) -> Result<()> {
    let diagnostics = reporter.finding_diagnostics(file_id, report);

    if args.output.is_some() {
        let mut buffer = NoColor::new(Vec::new());
        reporter.emit_to(&mut buffer, &diagnostics);
        let text = String::from_utf8_lossy(&buffer.into_inner()).into_owned();
        return emit(args, text);
    }

    let writer = StandardStream::stdout(ColorChoice::Auto);
    reporter.emit_to(&mut writer.lock(), &diagnostics);
    Ok(())
}
