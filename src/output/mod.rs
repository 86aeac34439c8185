//! Output formatters for reports.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

use crate::analyzers::debt::{DebtRecord, Severity};
use crate::analyzers::metrics::ComplexityStats;
use crate::core::Result;
use crate::orchestrator::{FileFailure, FileOutcome, HistoryReport, HistorySummary, ProjectReport};

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Markdown,
    Text,
}

/// Counts per severity band over a whole report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeveritySummary {
    pub total_files: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    pub average_score: f64,
    pub total_effort_hours: u64,
}

impl SeveritySummary {
    pub fn from_records(records: &[DebtRecord]) -> Self {
        let mut summary = Self {
            total_files: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.severity {
                Severity::Low => summary.low += 1,
                Severity::Medium => summary.medium += 1,
                Severity::High => summary.high += 1,
                Severity::Critical => summary.critical += 1,
            }
            summary.total_effort_hours += u64::from(record.estimated_effort);
        }
        if !records.is_empty() {
            summary.average_score =
                records.iter().map(|r| r.debt_score).sum::<f64>() / records.len() as f64;
        }
        summary
    }
}

/// A project report narrowed for display: ranked, filtered and truncated.
#[derive(Debug, Serialize)]
pub struct ProjectView<'a> {
    pub root: &'a Path,
    pub generated_at: DateTime<Utc>,
    pub history: &'a HistorySummary,
    pub summary: SeveritySummary,
    pub records: Vec<&'a DebtRecord>,
    pub failures: &'a [FileFailure],
}

impl<'a> ProjectView<'a> {
    /// Rank records by score, keep those at or above `min_severity`, then the first `top`.
    pub fn new(report: &'a ProjectReport, min_severity: Option<Severity>, top: Option<usize>) -> Self {
        let records = report
            .ranked()
            .into_iter()
            .filter(|r| min_severity.map_or(true, |min| r.severity >= min))
            .take(top.unwrap_or(usize::MAX))
            .collect();
        Self {
            root: &report.root,
            generated_at: report.generated_at,
            history: &report.history,
            summary: SeveritySummary::from_records(&report.records),
            records,
            failures: &report.failures,
        }
    }
}

impl Format {
    /// Write a directory-mode report.
    pub fn write_project<W: Write>(&self, view: &ProjectView<'_>, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => write_json(view, writer),
            Format::Markdown => project_markdown(view, writer),
            Format::Text => project_text(view, writer),
        }
    }

    /// Write a single-file outcome.
    pub fn write_file_outcome<W: Write>(&self, outcome: &FileOutcome, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => write_json(outcome, writer),
            Format::Markdown => outcome_markdown(outcome, writer),
            Format::Text => outcome_text(outcome, writer),
        }
    }

    /// Write a history listing.
    pub fn write_history<W: Write>(
        &self,
        report: &HistoryReport,
        top: Option<usize>,
        writer: &mut W,
    ) -> Result<()> {
        let limit = top.unwrap_or(usize::MAX);
        match self {
            Format::Json => {
                let mut value = serde_json::to_value(report)?;
                if let Some(Value::Array(files)) = value.get_mut("files") {
                    files.truncate(limit);
                }
                write_json(&value, writer)
            }
            Format::Markdown => history_markdown(report, limit, writer),
            Format::Text => history_text(report, limit, writer),
        }
    }

    /// Write static metrics for one file.
    pub fn write_metrics<W: Write>(
        &self,
        path: &Path,
        metrics: &ComplexityStats,
        writer: &mut W,
    ) -> Result<()> {
        match self {
            Format::Json => write_json(metrics, writer),
            Format::Markdown => {
                writeln!(writer, "# Static Metrics: `{}`\n", path.display())?;
                metrics_table(metrics, writer)
            }
            Format::Text => {
                writeln!(writer, "{}", path.display().to_string().bold())?;
                metrics_text(metrics, writer, 1)
            }
        }
    }
}

fn write_json<T: Serialize + ?Sized, W: Write>(data: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, data)?;
    writeln!(writer)?;
    Ok(())
}

fn history_line(history: &HistorySummary) -> String {
    match &history.warning {
        Some(warning) => format!("unavailable ({warning})"),
        None => {
            let head = history
                .head
                .as_deref()
                .map(|sha| format!(" at {}", &sha[..sha.len().min(8)]))
                .unwrap_or_default();
            format!(
                "{} commits{head}, {} files with history",
                history.commits_scanned, history.files_with_history
            )
        }
    }
}

fn focus(record: &DebtRecord) -> String {
    match record.focus_line {
        Some(line) => format!("{}:{}", record.file_key, line),
        None => record.file_key.to_string(),
    }
}

fn flags(record: &DebtRecord) -> String {
    if record.risk_flags.is_empty() {
        return "-".to_string();
    }
    record
        .risk_flags
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn project_markdown<W: Write>(view: &ProjectView<'_>, writer: &mut W) -> Result<()> {
    let s = &view.summary;
    writeln!(writer, "# Technical Debt Report\n")?;
    writeln!(writer, "**Root**: `{}`\n", view.root.display())?;
    writeln!(writer, "**History**: {}\n", history_line(view.history))?;
    writeln!(
        writer,
        "**Files**: {} | **Average Score**: {:.2} | **Estimated Effort**: {}h\n",
        s.total_files, s.average_score, s.total_effort_hours
    )?;

    writeln!(writer, "| Severity | Files |")?;
    writeln!(writer, "| --- | --- |")?;
    for (name, count) in [
        ("Critical", s.critical),
        ("High", s.high),
        ("Medium", s.medium),
        ("Low", s.low),
    ] {
        writeln!(writer, "| {name} | {count} |")?;
    }
    writeln!(writer)?;

    writeln!(writer, "## Files\n")?;
    if view.records.is_empty() {
        writeln!(writer, "_No items_\n")?;
    } else {
        writeln!(
            writer,
            "| File | Score | Severity | Effort | Heat | Complexity | MI | Flags |"
        )?;
        writeln!(writer, "| --- | --- | --- | --- | --- | --- | --- | --- |")?;
        for record in &view.records {
            writeln!(
                writer,
                "| `{}` | {:.2} | {} | {}h | {:.2} | {} | {:.1} | {} |",
                focus(record),
                record.debt_score,
                record.severity,
                record.estimated_effort,
                record.heat.heat,
                format_number(record.metrics.max_complexity),
                record.metrics.maintainability_index,
                flags(record)
            )?;
        }
        writeln!(writer)?;
    }

    if !view.failures.is_empty() {
        writeln!(writer, "## Failures\n")?;
        writeln!(writer, "| File | Reason |")?;
        writeln!(writer, "| --- | --- |")?;
        for failure in view.failures {
            writeln!(writer, "| `{}` | {} |", failure.file_key, failure.reason)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.as_str().to_uppercase());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.green(),
    }
}

fn project_text<W: Write>(view: &ProjectView<'_>, writer: &mut W) -> Result<()> {
    let s = &view.summary;
    writeln!(
        writer,
        "{} {}",
        "Technical debt:".bold(),
        view.root.display()
    )?;
    let history = history_line(view.history);
    if view.history.available {
        writeln!(writer, "History: {history}")?;
    } else {
        writeln!(writer, "History: {}", history.yellow())?;
    }
    writeln!(
        writer,
        "Files: {}  critical {}  high {}  medium {}  low {}  avg {:.2}  effort {}h\n",
        s.total_files, s.critical, s.high, s.medium, s.low, s.average_score, s.total_effort_hours
    )?;

    for record in &view.records {
        writeln!(
            writer,
            "  {:.2}  {}  {:>4}h  {}  {}",
            record.debt_score,
            severity_label(record.severity),
            record.estimated_effort,
            focus(record),
            flags(record).dimmed()
        )?;
    }

    if !view.failures.is_empty() {
        writeln!(writer, "\n{}", "Failures:".red().bold())?;
        for failure in view.failures {
            writeln!(writer, "  {}: {}", failure.file_key, failure.reason)?;
        }
    }
    Ok(())
}

fn record_markdown<W: Write>(record: &DebtRecord, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Debt Record: `{}`\n", record.file_key)?;
    writeln!(
        writer,
        "**Score**: {:.2} | **Severity**: {} | **Effort**: {}h\n",
        record.debt_score, record.severity, record.estimated_effort
    )?;
    if let Some(line) = record.focus_line {
        writeln!(writer, "**Focus Line**: {line}\n")?;
    }
    writeln!(writer, "**Risk Flags**: {}\n", flags(record))?;

    writeln!(writer, "## Score Breakdown\n")?;
    writeln!(writer, "| Component | Contribution |")?;
    writeln!(writer, "| --- | --- |")?;
    for (name, value) in record.score_breakdown.ranked() {
        writeln!(writer, "| {} | {:.3} |", format_key(name), value)?;
    }
    writeln!(writer)?;

    writeln!(writer, "## History\n")?;
    writeln!(
        writer,
        "**Changes**: {} | **Churn**: {} | **Authors**: {} | **Heat**: {:.2}\n",
        record.change_count, record.churn, record.author_count, record.heat.heat
    )?;

    writeln!(writer, "## Static Metrics\n")?;
    metrics_table(&record.metrics, writer)
}

fn outcome_markdown<W: Write>(outcome: &FileOutcome, writer: &mut W) -> Result<()> {
    match outcome {
        FileOutcome::Analyzed { record, .. } => record_markdown(record, writer),
        FileOutcome::NotFound { path } => {
            writeln!(writer, "**Not found**: `{path}`")?;
            Ok(())
        }
        FileOutcome::Unsupported { path, reason } => {
            writeln!(writer, "**Unsupported**: `{path}` ({reason})")?;
            Ok(())
        }
        FileOutcome::Failed(failure) => {
            writeln!(writer, "**Failed**: `{}` ({})", failure.file_key, failure.reason)?;
            Ok(())
        }
    }
}

fn outcome_text<W: Write>(outcome: &FileOutcome, writer: &mut W) -> Result<()> {
    match outcome {
        FileOutcome::Analyzed { record, .. } => {
            writeln!(
                writer,
                "{}  {:.2}  {}  {}h",
                focus(record).bold(),
                record.debt_score,
                severity_label(record.severity),
                record.estimated_effort
            )?;
            writeln!(writer, "  flags: {}", flags(record))?;
            let parts: Vec<String> = record
                .score_breakdown
                .ranked()
                .into_iter()
                .map(|(name, value)| format!("{name} {value:.3}"))
                .collect();
            writeln!(writer, "  breakdown: {}", parts.join(", "))?;
            writeln!(
                writer,
                "  history: {} changes, {} lines churned, {} authors, heat {:.2}",
                record.change_count, record.churn, record.author_count, record.heat.heat
            )?;
            metrics_text(&record.metrics, writer, 1)
        }
        FileOutcome::NotFound { path } => {
            writeln!(writer, "{} {path}", "not found:".yellow())?;
            Ok(())
        }
        FileOutcome::Unsupported { path, reason } => {
            writeln!(writer, "{} {path} ({reason})", "unsupported:".yellow())?;
            Ok(())
        }
        FileOutcome::Failed(failure) => {
            writeln!(
                writer,
                "{} {} ({})",
                "failed:".red(),
                failure.file_key,
                failure.reason
            )?;
            Ok(())
        }
    }
}

fn history_markdown<W: Write>(report: &HistoryReport, limit: usize, writer: &mut W) -> Result<()> {
    writeln!(writer, "# File History\n")?;
    writeln!(writer, "**Root**: `{}`\n", report.root.display())?;
    writeln!(writer, "**History**: {}\n", history_line(&report.history))?;
    if report.files.is_empty() {
        writeln!(writer, "_No items_\n")?;
        return Ok(());
    }
    writeln!(
        writer,
        "| File | Changes | Churn | Authors | Last Modified | Recency | Heat |"
    )?;
    writeln!(writer, "| --- | --- | --- | --- | --- | --- | --- |")?;
    for entry in report.files.iter().take(limit) {
        writeln!(
            writer,
            "| `{}` | {} | {} | {} | {} | {:.2} | {:.2} |",
            entry.file_key,
            entry.change_count,
            entry.churn,
            entry.author_count,
            format_date(entry.last_modified),
            entry.heat.recency,
            entry.heat.heat
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

fn history_text<W: Write>(report: &HistoryReport, limit: usize, writer: &mut W) -> Result<()> {
    writeln!(writer, "{} {}", "History:".bold(), report.root.display())?;
    writeln!(writer, "{}\n", history_line(&report.history))?;
    for entry in report.files.iter().take(limit) {
        writeln!(
            writer,
            "  {:.2}  {:>4} changes  {:>6} churn  {:>2} authors  {}  {}",
            entry.heat.heat,
            entry.change_count,
            entry.churn,
            entry.author_count,
            format_date(entry.last_modified).dimmed(),
            entry.file_key
        )?;
    }
    Ok(())
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Scalar metrics as a two-column table; samples listed after it.
fn metrics_table<W: Write>(metrics: &ComplexityStats, writer: &mut W) -> Result<()> {
    let value = serde_json::to_value(metrics)?;
    writeln!(writer, "| Metric | Value |")?;
    writeln!(writer, "| --- | --- |")?;
    if let Value::Object(map) = &value {
        for (key, val) in map {
            match val {
                Value::Array(_) if key == "smell_samples" => {}
                Value::Array(items) => {
                    let joined: Vec<String> = items.iter().map(format_scalar).collect();
                    writeln!(writer, "| {} | {} |", format_key(key), joined.join(", "))?;
                }
                _ => writeln!(writer, "| {} | {} |", format_key(key), format_scalar(val))?,
            }
        }
    }
    writeln!(writer)?;

    if !metrics.smell_samples.is_empty() {
        writeln!(writer, "### Smell Samples\n")?;
        writeln!(writer, "| Kind | Line | Snippet |")?;
        writeln!(writer, "| --- | --- | --- |")?;
        for sample in &metrics.smell_samples {
            writeln!(
                writer,
                "| {} | {} | `{}` |",
                sample.kind,
                sample.line,
                sample.snippet.replace('|', "\\|")
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn metrics_text<W: Write>(metrics: &ComplexityStats, writer: &mut W, indent: usize) -> Result<()> {
    let prefix = "  ".repeat(indent);
    writeln!(
        writer,
        "{prefix}{} ({}), {} lines, {} functions",
        metrics.language,
        format!("{:?}", metrics.mode).to_lowercase(),
        metrics.lines_of_code,
        metrics.function_count
    )?;
    writeln!(
        writer,
        "{prefix}complexity avg {} max {}, maintainability {:.1}, comments {:.0}%",
        format_number(metrics.avg_complexity),
        format_number(metrics.max_complexity),
        metrics.maintainability_index,
        metrics.comment_density * 100.0
    )?;
    if !metrics.smell_flags.is_empty() {
        let smells: Vec<&str> = metrics.smell_flags.iter().map(|k| k.as_str()).collect();
        writeln!(
            writer,
            "{prefix}smells {:.2}: {}",
            metrics.smell_score,
            smells.join(", ")
        )?;
    }
    for sample in &metrics.smell_samples {
        writeln!(
            writer,
            "{prefix}  {}:{} {}",
            sample.kind.as_str().dimmed(),
            sample.line,
            sample.snippet
        )?;
    }
    if metrics.is_minified_candidate {
        writeln!(writer, "{prefix}{}", "minified candidate".yellow())?;
    }
    Ok(())
}

fn format_key(key: &str) -> String {
    key.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 {
        format!("{}", f as i64)
    } else {
        format!("{:.2}", f)
    }
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Value::Null => "-".to_string(),
        _ => value.to_string(),
    }
}
