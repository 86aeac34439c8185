//! Debtheat CLI - technical debt scoring from history heat and static metrics.

use std::io::stdout;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use debtheat::analyzers::metrics::StaticAnalyzer;
use debtheat::cli::{Cli, Command};
use debtheat::config::Config;
use debtheat::orchestrator::{AnalysisOrchestrator, AnalysisOutcome};
use debtheat::output::{Format, ProjectView};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default(&cli.path)?,
    };
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }

    let format = Format::from(cli.format);
    let mut out = stdout().lock();

    match cli.command {
        Command::Analyze(args) => {
            let orchestrator = AnalysisOrchestrator::new(config)?;
            let outcome = orchestrator
                .analyze_project(&cli.path, args.file.as_deref())
                .with_context(|| format!("analyzing {}", cli.path.display()))?;
            match outcome {
                AnalysisOutcome::Project(report) => {
                    let view =
                        ProjectView::new(&report, args.min_severity.map(Into::into), args.top);
                    format.write_project(&view, &mut out)?;
                }
                AnalysisOutcome::File(outcome) => format.write_file_outcome(&outcome, &mut out)?,
            }
        }
        Command::History(args) => {
            if args.max_commits.is_some() {
                config.history.max_commits = args.max_commits;
            }
            let orchestrator = AnalysisOrchestrator::new(config)?;
            let report = orchestrator.history(&cli.path)?;
            format.write_history(&report, args.top, &mut out)?;
        }
        Command::Inspect(args) => {
            let path = if args.file.is_absolute() {
                args.file.clone()
            } else {
                cli.path.join(&args.file)
            };
            let metrics = StaticAnalyzer::new(config.thresholds)
                .analyze_file(&path)
                .with_context(|| format!("inspecting {}", path.display()))?;
            format.write_metrics(&args.file, &metrics, &mut out)?;
        }
    }

    Ok(())
}
