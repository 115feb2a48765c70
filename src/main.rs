use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use covx::config::Config;
use covx::coverage::{self, file_metrics_for_path};
use covx::junit;
use covx::index::IngestStats;
use covx::{encode, CoverageIndex, CovxError, Diagnostic, Encoded, OutputFormat, TestIdentity};

const CONFIG_FILE: &str = "covx.toml";

#[derive(Parser)]
#[command(name = "covx")]
#[command(about = "Clover coverage index and test-result explorer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: covx.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format, repeat for several (overrides config)
    #[arg(short, long, global = true, value_enum)]
    format: Vec<OutputFormat>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the coverage tree of each Clover report
    Tree {
        /// Report files or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Load Clover reports into one index and print its summary
    Index {
        /// Report files or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        /// Also list every stored coverage fact
        #[arg(long)]
        dump: bool,
    },

    /// Print computed metrics for one source file of a Clover report
    Metrics {
        /// Clover report
        report: PathBuf,

        /// Source file path as written in the report
        source: String,
    },

    /// Print test result reports
    Results {
        /// Report files or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

/// How models are written to stdout.
struct Output {
    formats: Vec<OutputFormat>,
    pretty: bool,
}

/// An input that could not be processed.
struct FileFailure {
    path: PathBuf,
    error: CovxError,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load(path)
            .with_context(|| format!("Could not load {}", path.display()))?,
        None => Config::load_or_default(Path::new(CONFIG_FILE))?,
    };

    let level = if cli.verbose { "debug" } else { config.log.level.as_str() };
    init_tracing(level);

    let output = Output {
        formats: if cli.format.is_empty() {
            config.output.formats.clone()
        } else {
            cli.format.clone()
        },
        pretty: config.output.pretty,
    };

    let failures = match cli.command {
        Commands::Tree { paths } => cmd_tree(&expand_inputs(&paths)?, &output)?,
        Commands::Index { paths, dump } => cmd_index(&expand_inputs(&paths)?, &config, dump)?,
        Commands::Metrics { report, source } => cmd_metrics(&report, &source, &output)?,
        Commands::Results { paths } => cmd_results(&expand_inputs(&paths)?, &output)?,
    };

    print_failures(&failures);
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Expand glob patterns; plain paths are passed through untouched.
fn expand_inputs(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for arg in args {
        if !arg.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(arg));
            continue;
        }

        let matches = glob::glob(arg).with_context(|| format!("Invalid glob pattern: {}", arg))?;
        let mut found: Vec<PathBuf> = matches.filter_map(|p| p.ok()).collect();
        if found.is_empty() {
            tracing::warn!(pattern = %arg, "pattern matched no files");
        }
        found.sort();
        paths.extend(found);
    }

    Ok(paths)
}

fn cmd_tree(paths: &[PathBuf], output: &Output) -> Result<Vec<FileFailure>> {
    let mut failures = Vec::new();

    for path in paths {
        let report = match coverage::parse_clover(path) {
            Ok(report) => report,
            Err(error) => {
                failures.push(FileFailure { path: path.clone(), error });
                continue;
            }
        };

        for project in &report.projects {
            let generated = project
                .generated_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unknown time".to_string());

            eprintln!(
                "\n{} {} {} ({}, {} packages, {} lines)",
                "📦".cyan(),
                path.display().to_string().bold(),
                project.name.cyan(),
                generated.dimmed(),
                project.packages.len(),
                project.line_count()
            );
            emit(project, output)?;
        }
        if report.projects.is_empty() {
            eprintln!("\n{} {} has no project", "📦".cyan(), path.display());
        }
        print_diagnostics(&report.diagnostics);
    }

    Ok(failures)
}

fn cmd_index(paths: &[PathBuf], config: &Config, dump: bool) -> Result<Vec<FileFailure>> {
    let mut index = CoverageIndex::with_width(config.index.handle_width);
    let mut failures = Vec::new();

    for path in paths {
        let ingested = coverage::parse_clover(path).and_then(|report| {
            let tests: Vec<TestIdentity> = report
                .projects
                .iter()
                .map(|p| TestIdentity::new(path.display().to_string(), p.name.as_str()))
                .collect();
            index.reserve(&tests, &report.projects)?;

            let mut stats = IngestStats::default();
            for (test, project) in tests.iter().zip(&report.projects) {
                let handle = index.test_index(test)?;
                stats.absorb(index.ingest_project(handle, project)?);
            }
            Ok((report.diagnostics, stats))
        });

        match ingested {
            Ok((diagnostics, stats)) => {
                println!(
                    "  {} {} ({} facts, {} lines without signal)",
                    "✓".green(),
                    path.display(),
                    stats.recorded,
                    stats.filtered
                );
                print_diagnostics(&diagnostics);
            }
            Err(error) => failures.push(FileFailure { path: path.clone(), error }),
        }
    }

    let summary = index.summary();
    println!("\n{}", "Index:".bold());
    for line in summary.to_string().lines() {
        println!("  {}", line);
    }
    println!("  {} {}", "Handle width:".dimmed(), index.width());

    if dump {
        println!("\n{}", "Coverage facts:".bold());
        for fact in index.describe() {
            println!("  {}", fact);
        }
    }

    Ok(failures)
}

fn cmd_metrics(report: &Path, source: &str, output: &Output) -> Result<Vec<FileFailure>> {
    let parsed = match coverage::parse_clover(report) {
        Ok(parsed) => parsed,
        Err(error) => {
            return Ok(vec![FileFailure {
                path: report.to_path_buf(),
                error,
            }])
        }
    };
    print_diagnostics(&parsed.diagnostics);

    let found: Vec<_> = parsed
        .projects
        .iter()
        .flat_map(|project| file_metrics_for_path(project, source))
        .collect();
    if found.is_empty() {
        eprintln!(
            "  {} {} is not part of {}",
            "!".yellow(),
            source,
            report.display()
        );
    }

    for metrics in &found {
        let m = &metrics.metrics;
        eprintln!("\n{} {}", "📊".cyan(), source.bold());
        eprintln!(
            "  {} {}/{} ({:.1}%)",
            "statements:".dimmed(),
            m.covered_statements,
            m.statements,
            m.statement_percentage()
        );
        eprintln!(
            "  {} {}/{} ({:.1}%)",
            "methods:".dimmed(),
            m.covered_methods,
            m.methods,
            m.method_percentage()
        );
        eprintln!(
            "  {} {}/{} ({:.1}%)",
            "conditionals:".dimmed(),
            m.covered_conditionals,
            m.conditionals,
            m.conditional_percentage()
        );
        eprintln!(
            "  {} {}/{} ({:.1}%)",
            "elements:".dimmed(),
            m.covered_elements,
            m.elements,
            m.element_percentage()
        );

        emit(metrics, output)?;
    }

    Ok(Vec::new())
}

fn cmd_results(paths: &[PathBuf], output: &Output) -> Result<Vec<FileFailure>> {
    let mut failures = Vec::new();

    for path in paths {
        let report = match junit::parse_test_results(path) {
            Ok(report) => report,
            Err(error) => {
                failures.push(FileFailure { path: path.clone(), error });
                continue;
            }
        };

        let failing = report.failing_cases().count();
        let status = if failing == 0 { "✓".green() } else { "✗".red() };
        eprintln!(
            "\n{} {} ({} suites, {} tests reported, {} failing cases)",
            status,
            path.display().to_string().bold(),
            report.suites.len(),
            report.total_tests(),
            failing
        );

        emit(&report, output)?;
    }

    Ok(failures)
}

/// Write `value` to stdout once per configured format.
fn emit<T: Serialize>(value: &T, output: &Output) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for &format in &output.formats {
        match encode(value, format, output.pretty)? {
            Encoded::Text(text) => writeln!(out, "{}", text)?,
            Encoded::Bytes(bytes) => out.write_all(&bytes)?,
        }
    }

    out.flush()?;
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("  {} {}", "!".yellow(), diagnostic);
    }
}

fn print_failures(failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }

    eprintln!(
        "\n{} {} input(s) could not be processed:",
        "⚠".yellow(),
        failures.len()
    );
    for failure in failures {
        let kind = if failure.error.is_format_error() {
            "rejected"
        } else {
            "failed"
        };
        eprintln!(
            "  {} {} {}: {}",
            "✗".red(),
            kind.red(),
            failure.path.display(),
            failure.error
        );
    }
}
