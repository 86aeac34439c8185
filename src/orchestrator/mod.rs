//! Analysis orchestrator - the single entry point over a project root.
//!
//! History mining and static analysis run concurrently on a bounded rayon
//! pool; scoring runs after both finish and reads the mined history by
//! shared reference. Per-file failures are collected next to the records and
//! never abort sibling files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::ThreadPool;
use serde::Serialize;

use crate::analyzers::debt::{DebtRecord, DebtScorer};
use crate::analyzers::history::{ChangeStats, HeatBreakdown, HistoryIndex, HistoryMiner};
use crate::analyzers::metrics::{ComplexityStats, StaticAnalyzer};
use crate::config::Config;
use crate::core::{
    AnalysisContext, Analyzer, Diagnostic, DiagnosticSink, Eligibility, Error, FileKey, FileSet,
    Result, TracingSink,
};

const FILE_SCHEME: &str = "file://";

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub file_key: FileKey,
    pub reason: String,
}

/// Whether history was available for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    pub commits_scanned: usize,
    pub files_with_history: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl HistorySummary {
    fn of(index: &HistoryIndex) -> Self {
        Self {
            available: index.is_available(),
            head: index.head.clone(),
            commits_scanned: index.commits_scanned,
            files_with_history: index.len(),
            warning: index.warning.clone(),
        }
    }
}

/// Directory-mode result: one record per eligible file plus failures.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub history: HistorySummary,
    pub records: Vec<DebtRecord>,
    pub failures: Vec<FileFailure>,
}

impl ProjectReport {
    /// Records ordered by descending debt score, ties by key.
    pub fn ranked(&self) -> Vec<&DebtRecord> {
        let mut records: Vec<&DebtRecord> = self.records.iter().collect();
        records.sort_by(|a, b| {
            b.debt_score
                .total_cmp(&a.debt_score)
                .then_with(|| a.file_key.cmp(&b.file_key))
        });
        records
    }
}

/// Single-file result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileOutcome {
    Analyzed {
        record: Box<DebtRecord>,
        history: HistorySummary,
    },
    /// The path does not name a real file.
    NotFound { path: String },
    /// The file exists but is not a type this tool analyzes.
    Unsupported { path: String, reason: String },
    /// The file exists and is supported but its content could not be read.
    Failed(FileFailure),
}

/// Result of [`AnalysisOrchestrator::analyze_project`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Project(ProjectReport),
    File(FileOutcome),
}

/// Per-file history listing for a project root.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub history: HistorySummary,
    pub files: Vec<HistoryEntry>,
}

/// History statistics and heat for one file.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub file_key: FileKey,
    pub change_count: u32,
    pub churn: u64,
    pub author_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
    pub heat: HeatBreakdown,
}

/// Coordinates the history miner, static analyzer and scorer.
pub struct AnalysisOrchestrator {
    config: Config,
    eligibility: Eligibility,
    miner: HistoryMiner,
    analyzer: StaticAnalyzer,
    scorer: DebtScorer,
    sink: Arc<dyn DiagnosticSink>,
}

impl AnalysisOrchestrator {
    /// Validate the configuration and build the components.
    ///
    /// Configuration invariant violations are the only construction errors.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let scorer = DebtScorer::from_config(&config)?;
        Ok(Self {
            eligibility: Eligibility::new(&config.exclude_patterns)?,
            miner: HistoryMiner::new(&config.history),
            analyzer: StaticAnalyzer::new(config.thresholds.clone()),
            scorer,
            config,
            sink: Arc::new(TracingSink),
        })
    }

    /// Replace the diagnostics sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze every eligible file under `root`, or just `file` when given.
    pub fn analyze_project(&self, root: &Path, file: Option<&str>) -> Result<AnalysisOutcome> {
        match file {
            Some(file) => self.analyze_file(root, file).map(AnalysisOutcome::File),
            None => self.analyze_directory(root).map(AnalysisOutcome::Project),
        }
    }

    /// Directory mode.
    pub fn analyze_directory(&self, root: &Path) -> Result<ProjectReport> {
        let start = Instant::now();
        let root = resolve_root(root)?;
        let files = FileSet::from_path(&root, &self.config)?;
        let ctx = AnalysisContext::new(&files, &self.config);
        let pool = self.thread_pool()?;
        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            threads = pool.current_num_threads(),
            "running {} and {} passes",
            self.miner.name(),
            self.analyzer.name()
        );

        let (history, analyses) = pool.install(|| {
            rayon::join(
                || self.miner.analyze(&ctx),
                || self.analyzer.analyze(&ctx),
            )
        });
        let history = history?;
        let analyses = analyses?;
        self.note_history(&root, &history);

        let now = Utc::now();
        let mut records = Vec::with_capacity(analyses.len());
        let mut failures = Vec::new();
        for analysis in analyses {
            match analysis.outcome {
                Ok(metrics) => {
                    let stats = history.get(&analysis.key);
                    records.push(self.score(analysis.key, stats, metrics, now));
                }
                // Unsupported files are silently left out of directory results.
                Err(Error::UnsupportedLanguage { .. }) => {
                    tracing::debug!(path = %analysis.path.display(), "skipping unsupported file");
                }
                Err(e) => failures.push(self.failure(analysis.key, &e)),
            }
        }
        records.sort_by(|a, b| a.file_key.cmp(&b.file_key));

        tracing::info!(
            "Analysis completed in {:?}: {} records, {} failures",
            start.elapsed(),
            records.len(),
            failures.len()
        );

        Ok(ProjectReport {
            root,
            generated_at: now,
            history: HistorySummary::of(&history),
            records,
            failures,
        })
    }

    /// Single-file mode. Missing and unsupported files are outcomes, not errors.
    pub fn analyze_file(&self, root: &Path, file: &str) -> Result<FileOutcome> {
        let root = resolve_root(root)?;
        let Some(path) = resolve_target(&root, file) else {
            return Ok(FileOutcome::NotFound {
                path: file.to_string(),
            });
        };
        let key = FileKey::from_path(&root, &path);
        let relative = path.strip_prefix(&root).unwrap_or(path.as_path());

        if let Some(exclusion) = self.eligibility.check(relative) {
            return Ok(FileOutcome::Unsupported {
                path: key.to_string(),
                reason: exclusion.reason().to_string(),
            });
        }

        let pool = self.thread_pool()?;
        let (history, metrics) = pool.install(|| {
            rayon::join(
                || self.miner.mine(&root),
                || self.analyzer.analyze_file(&path),
            )
        });
        self.note_history(&root, &history);

        match metrics {
            Ok(metrics) => {
                let stats = history.get(&key);
                let record = self.score(key, stats, metrics, Utc::now());
                Ok(FileOutcome::Analyzed {
                    record: Box::new(record),
                    history: HistorySummary::of(&history),
                })
            }
            Err(e) => Ok(FileOutcome::Failed(self.failure(key, &e))),
        }
    }

    /// Mine history only and list heat per file, hottest first.
    pub fn history(&self, root: &Path) -> Result<HistoryReport> {
        let root = resolve_root(root)?;
        let index = self.miner.mine(&root);
        self.note_history(&root, &index);

        let now = Utc::now();
        let mut files: Vec<HistoryEntry> = index
            .iter()
            .map(|(key, stats)| HistoryEntry {
                file_key: key.clone(),
                change_count: stats.change_count,
                churn: stats.churn(),
                author_count: stats.author_count(),
                last_modified: stats.last_modified,
                heat: HeatBreakdown::compute(Some(stats), self.scorer.heat_policy(), now),
            })
            .collect();
        files.sort_by(|a, b| {
            b.heat
                .heat
                .total_cmp(&a.heat.heat)
                .then_with(|| a.file_key.cmp(&b.file_key))
        });

        Ok(HistoryReport {
            root,
            generated_at: now,
            history: HistorySummary::of(&index),
            files,
        })
    }

    fn score(
        &self,
        key: FileKey,
        history: Option<&ChangeStats>,
        metrics: ComplexityStats,
        now: DateTime<Utc>,
    ) -> DebtRecord {
        let record = self.scorer.score(key, history, metrics, now);
        self.sink.record(&Diagnostic::scored(
            record.file_key.as_str(),
            record.debt_score,
            record.severity,
        ));
        record
    }

    fn failure(&self, file_key: FileKey, error: &Error) -> FileFailure {
        let failure = FileFailure {
            file_key,
            reason: error.to_string(),
        };
        self.sink
            .record(&Diagnostic::note(failure.file_key.as_str(), &failure.reason));
        failure
    }

    fn note_history(&self, root: &Path, history: &HistoryIndex) {
        if let Some(warning) = &history.warning {
            self.sink.record(&Diagnostic::note(
                root.display().to_string(),
                format!("history unavailable: {warning}"),
            ));
        }
    }

    fn thread_pool(&self) -> Result<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.unwrap_or(0))
            .build()
            .map_err(|e| Error::config(format!("cannot build worker pool: {e}")))
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(Error::FileNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(root.canonicalize()?)
}

/// Turn a client-supplied path into a file under `root`.
///
/// Accepts plain relative or absolute paths and `file://` URIs. Other URI
/// schemes, paths that are not regular files and files outside `root`
/// resolve to `None`. `root` must already be canonical.
fn resolve_target(root: &Path, raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    let raw = match raw.strip_prefix(FILE_SCHEME) {
        Some(rest) => rest,
        None if raw.contains("://") => return None,
        None => raw,
    };
    if raw.is_empty() {
        return None;
    }

    let candidate = Path::new(raw);
    let candidate = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    if !candidate.is_file() {
        return None;
    }
    let candidate = candidate.canonicalize().ok()?;
    candidate.starts_with(root).then_some(candidate)
}
