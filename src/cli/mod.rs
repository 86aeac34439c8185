//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::analyzers::debt::Severity;
use crate::output::Format;

/// Debtheat - technical debt scoring from git history heat and static metrics.
#[derive(Parser)]
#[command(name = "debtheat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project root to analyze
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score technical debt for every file, or a single file
    #[command(alias = "debt")]
    Analyze(AnalyzeArgs),

    /// List per-file change history and heat
    #[command(alias = "heat")]
    History(HistoryArgs),

    /// Show static metrics for one file
    #[command(alias = "metrics")]
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analyze a single file (relative to the root, absolute, or file:// URI)
    #[arg(long)]
    pub file: Option<String>,

    /// Maximum number of files to report
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Only report files at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of files to report
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Stop after this many commits
    #[arg(long)]
    pub max_commits: Option<usize>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// File to inspect
    pub file: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Markdown => Format::Markdown,
            OutputFormat::Text => Format::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}
