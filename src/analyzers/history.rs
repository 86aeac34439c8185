//! History miner - per-file change statistics and heat scores.
//!
//! Walks every non-merge commit reachable from HEAD once, newest first, and
//! accumulates change counts, line churn, distinct authors and the last
//! modification time per file.
//!
//! # Heat score
//!
//! heat = min(1, 0.35 * change + 0.30 * churn + 0.20 * authors + 0.15 * recency)
//!
//! - change  = ln(1 + commits) / ln(1 + change_saturation), capped at 1
//! - churn   = ln(1 + added + deleted) / ln(1 + churn_saturation), capped at 1
//! - authors = authors / author_saturation, capped at 1
//! - recency = 1 up to the short window, ((long - d) / (long - short))^2 up to
//!   the long window, 0 beyond

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{HeatPolicy, HistoryConfig};
use crate::core::{
    is_excluded_path, AnalysisContext, Analyzer as AnalyzerTrait, FileKey, Language, Result,
};
use crate::git::GitRepo;

const CHANGE_WEIGHT: f64 = 0.35;
const CHURN_WEIGHT: f64 = 0.30;
const AUTHOR_WEIGHT: f64 = 0.20;
const RECENCY_WEIGHT: f64 = 0.15;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Stable contributor identity: lowercase `name <email>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(name: &str, email: &str) -> Self {
        Self(format!(
            "{} <{}>",
            name.trim().to_lowercase(),
            email.trim().to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Change statistics for one file across the mined history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Number of commits touching the file.
    pub change_count: u32,
    /// Cumulative added lines.
    pub added_lines: u64,
    /// Cumulative deleted lines.
    pub deleted_lines: u64,
    /// Distinct contributors.
    pub authors: BTreeSet<AuthorId>,
    /// Most recent commit touching the file.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ChangeStats {
    /// Added plus deleted lines.
    pub fn churn(&self) -> u64 {
        self.added_lines + self.deleted_lines
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    fn record(&mut self, author: &AuthorId, additions: u32, deletions: u32, at: Option<DateTime<Utc>>) {
        self.change_count += 1;
        self.added_lines += u64::from(additions);
        self.deleted_lines += u64::from(deletions);
        self.authors.insert(author.clone());
        if at > self.last_modified {
            self.last_modified = at;
        }
    }
}

/// Result of one mining run, keyed by file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryIndex {
    files: HashMap<FileKey, ChangeStats>,
    /// HEAD commit the walk started from.
    pub head: Option<String>,
    /// Non-merge commits visited.
    pub commits_scanned: usize,
    /// Why the history signal is missing or degraded, if it is.
    pub warning: Option<String>,
}

impl HistoryIndex {
    /// Index with no history signal and the reason for it.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            warning: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Whether any commit was mined.
    pub fn is_available(&self) -> bool {
        self.commits_scanned > 0
    }

    pub fn get(&self, key: &FileKey) -> Option<&ChangeStats> {
        self.files.get(key)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileKey, &ChangeStats)> {
        self.files.iter()
    }
}

/// Per-component heat scores for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatBreakdown {
    pub change: f64,
    pub churn: f64,
    pub authors: f64,
    pub recency: f64,
    /// Weighted sum, capped at 1.
    pub heat: f64,
}

impl HeatBreakdown {
    /// Heat for a file; absent history scores zero on every component.
    pub fn compute(stats: Option<&ChangeStats>, policy: &HeatPolicy, now: DateTime<Utc>) -> Self {
        let Some(stats) = stats else {
            return Self::default();
        };

        let change = log_saturate(f64::from(stats.change_count), policy.change_saturation);
        let churn = log_saturate(stats.churn() as f64, policy.churn_saturation);
        let authors = (stats.author_count() as f64 / policy.author_saturation).min(1.0);
        let recency = stats
            .last_modified
            .map(|at| recency_score(at, now, policy))
            .unwrap_or(0.0);

        let heat = (CHANGE_WEIGHT * change
            + CHURN_WEIGHT * churn
            + AUTHOR_WEIGHT * authors
            + RECENCY_WEIGHT * recency)
            .min(1.0);

        Self {
            change,
            churn,
            authors,
            recency,
            heat,
        }
    }
}

fn log_saturate(value: f64, saturation: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    (value.ln_1p() / saturation.ln_1p()).min(1.0)
}

/// Convex decay from 1 at the short window to 0 at the long window.
pub fn recency_score(last_modified: DateTime<Utc>, now: DateTime<Utc>, policy: &HeatPolicy) -> f64 {
    let days = ((now - last_modified).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
    if days <= policy.recency_short_days {
        1.0
    } else if days >= policy.recency_long_days {
        0.0
    } else {
        let remaining = (policy.recency_long_days - days)
            / (policy.recency_long_days - policy.recency_short_days);
        remaining * remaining
    }
}

/// Mines version-control history for a project root.
pub struct HistoryMiner {
    extensions: HashSet<String>,
    max_commits: Option<usize>,
}

impl Default for HistoryMiner {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl HistoryMiner {
    /// Create a miner restricted to the configured extension allow-list.
    pub fn new(config: &HistoryConfig) -> Self {
        let extensions = match &config.extensions {
            Some(exts) => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            None => Language::source_extensions()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        Self {
            extensions,
            max_commits: config.max_commits,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e.to_lowercase()))
    }

    /// Mine history for `root`. Never fails: problems degrade to an index
    /// without history signal and a warning.
    pub fn mine(&self, root: &Path) -> HistoryIndex {
        let start = Instant::now();
        let index = match self.try_mine(root) {
            Ok(index) => index,
            Err(e) => HistoryIndex::unavailable(e.to_string()),
        };

        match &index.warning {
            Some(reason) => tracing::warn!(
                root = %root.display(),
                reason = %reason,
                "history unavailable, scoring without history signal"
            ),
            None => tracing::info!(
                "History mining completed in {:?}: {} commits, {} files",
                start.elapsed(),
                index.commits_scanned,
                index.len()
            ),
        }
        index
    }

    fn try_mine(&self, root: &Path) -> Result<HistoryIndex> {
        let repo = GitRepo::discover(root)?;
        let root = root.canonicalize()?;
        // Analysis root relative to the work tree; empty at the top level.
        let prefix = FileKey::from_path(repo.root(), &root);

        let commits = repo.log(self.max_commits, |path| {
            self.accepts(path) && !is_excluded_path(path)
        })?;
        if commits.is_empty() {
            return Ok(HistoryIndex::unavailable("repository has no commits"));
        }

        let mut files: HashMap<FileKey, ChangeStats> = HashMap::new();
        for commit in &commits {
            let author = AuthorId::new(&commit.author, &commit.email);
            let at = DateTime::<Utc>::from_timestamp(commit.timestamp, 0);
            for change in &commit.files {
                let Some(key) = FileKey::new(change.path.to_string_lossy()).strip_prefix(&prefix)
                else {
                    continue;
                };
                files
                    .entry(key)
                    .or_default()
                    .record(&author, change.additions, change.deletions, at);
            }
        }

        Ok(HistoryIndex {
            files,
            head: repo.head_sha()?,
            commits_scanned: commits.len(),
            warning: None,
        })
    }
}

impl AnalyzerTrait for HistoryMiner {
    type Output = HistoryIndex;

    fn name(&self) -> &'static str {
        "history"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        Ok(self.mine(ctx.root))
    }
}
