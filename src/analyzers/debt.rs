//! Debt scorer - fuses history heat and static metrics into one record per file.
//!
//! debt = 0.30 heat + 0.20 complexity + 0.15 maintainability + 0.10 size
//!      + 0.05 comment_scarcity + 0.20 smell
//!
//! Every component is normalized to [0, 1] before weighting, so the fused score
//! stays in [0, 1] and the weighted contributions sum to it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::history::{ChangeStats, HeatBreakdown};
use crate::analyzers::metrics::{ComplexityStats, SmellKind};
use crate::config::{
    Config, HeatPolicy, Normalization, RiskThresholds, ScoringConfig, SeverityBands, Weights,
};
use crate::core::{Error, FileKey, Result};

/// Severity band of a debt score, ordered `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::InvalidArgument(format!(
                "unknown severity '{other}', expected low, medium, high or critical"
            ))),
        }
    }
}

/// Qualitative risk flags, each triggered by its own component test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFlag {
    Hotspot,
    HighComplexity,
    LowMaintainability,
    LargeFile,
    Undercommented,
    Smelly,
    RecentlyModified,
    Minified,
}

impl RiskFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hotspot => "hotspot",
            Self::HighComplexity => "high-complexity",
            Self::LowMaintainability => "low-maintainability",
            Self::LargeFile => "large-file",
            Self::Undercommented => "undercommented",
            Self::Smelly => "smelly",
            Self::RecentlyModified => "recently-modified",
            Self::Minified => "minified",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized components, each in [0, 1], before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub heat: f64,
    pub complexity: f64,
    pub maintainability: f64,
    pub size: f64,
    pub comment_scarcity: f64,
    pub smell: f64,
}

/// Weighted contribution of each component; the values sum to the debt score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub heat: f64,
    pub complexity: f64,
    pub maintainability: f64,
    pub size: f64,
    pub comment_scarcity: f64,
    pub smell: f64,
}

impl ScoreBreakdown {
    fn weigh(components: &ScoreComponents, weights: &Weights) -> Self {
        Self {
            heat: components.heat * weights.heat,
            complexity: components.complexity * weights.complexity,
            maintainability: components.maintainability * weights.maintainability,
            size: components.size * weights.size,
            comment_scarcity: components.comment_scarcity * weights.comment_scarcity,
            smell: components.smell * weights.smell,
        }
    }

    /// Sum of all contributions.
    pub fn total(&self) -> f64 {
        self.heat
            + self.complexity
            + self.maintainability
            + self.size
            + self.comment_scarcity
            + self.smell
    }

    /// Contributions by component name, largest first.
    pub fn ranked(&self) -> Vec<(&'static str, f64)> {
        let mut parts = vec![
            ("heat", self.heat),
            ("complexity", self.complexity),
            ("maintainability", self.maintainability),
            ("size", self.size),
            ("comment_scarcity", self.comment_scarcity),
            ("smell", self.smell),
        ];
        parts.sort_by(|a, b| b.1.total_cmp(&a.1));
        parts
    }
}

/// Debt assessment of one file for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub file_key: FileKey,
    pub debt_score: f64,
    pub severity: Severity,
    /// Estimated remediation effort in hours.
    pub estimated_effort: u32,
    pub risk_flags: BTreeSet<RiskFlag>,
    pub score_breakdown: ScoreBreakdown,
    pub components: ScoreComponents,
    /// Representative 1-indexed line for editor navigation.
    pub focus_line: Option<u32>,
    pub generated_at: DateTime<Utc>,
    pub heat: HeatBreakdown,
    pub change_count: u32,
    pub churn: u64,
    pub author_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
    pub metrics: ComplexityStats,
}

/// Scores files under a validated scoring policy.
#[derive(Debug, Clone)]
pub struct DebtScorer {
    weights: Weights,
    bands: SeverityBands,
    normalization: Normalization,
    risk: RiskThresholds,
    heat_policy: HeatPolicy,
}

impl DebtScorer {
    /// Create a scorer, rejecting weights that do not sum to one, overlapping
    /// severity bands and non-positive or non-finite normalizers.
    pub fn new(scoring: &ScoringConfig, heat_policy: &HeatPolicy) -> Result<Self> {
        scoring.weights.validate()?;
        scoring.bands.validate()?;
        scoring.normalization.validate()?;
        scoring.risk.validate()?;
        Ok(Self {
            weights: scoring.weights,
            bands: scoring.bands,
            normalization: scoring.normalization.clone(),
            risk: scoring.risk.clone(),
            heat_policy: heat_policy.clone(),
        })
    }

    /// Create a scorer from a full configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.scoring, &config.history.heat)
    }

    pub fn heat_policy(&self) -> &HeatPolicy {
        &self.heat_policy
    }

    /// Band containing `score`.
    pub fn severity_for(&self, score: f64) -> Severity {
        if score >= self.bands.critical {
            Severity::Critical
        } else if score >= self.bands.high {
            Severity::High
        } else if score >= self.bands.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Score one file. Absent history contributes zero heat.
    pub fn score(
        &self,
        file_key: FileKey,
        history: Option<&ChangeStats>,
        metrics: ComplexityStats,
        now: DateTime<Utc>,
    ) -> DebtRecord {
        let heat = HeatBreakdown::compute(history, &self.heat_policy, now);
        let components = self.components(heat.heat, &metrics);
        let score_breakdown = ScoreBreakdown::weigh(&components, &self.weights);
        let debt_score = score_breakdown.total().clamp(0.0, 1.0);

        DebtRecord {
            file_key,
            debt_score,
            severity: self.severity_for(debt_score),
            estimated_effort: estimate_effort(
                debt_score,
                metrics.lines_of_code,
                metrics.avg_complexity,
            ),
            risk_flags: self.risk_flags(&components, &heat, &metrics),
            score_breakdown,
            components,
            focus_line: focus_line(&metrics),
            generated_at: now,
            heat,
            change_count: history.map_or(0, |h| h.change_count),
            churn: history.map_or(0, ChangeStats::churn),
            author_count: history.map_or(0, ChangeStats::author_count),
            last_modified: history.and_then(|h| h.last_modified),
            metrics,
        }
    }

    /// Normalize raw signals into [0, 1] components.
    pub fn components(&self, heat: f64, metrics: &ComplexityStats) -> ScoreComponents {
        let n = &self.normalization;

        let size = saturate(metrics.lines_of_code as f64, n.loc_saturation)
            .max(saturate(metrics.function_count as f64, n.function_saturation));

        let comment_scarcity = if metrics.lines_of_code == 0 || n.comment_target <= 0.0 {
            0.0
        } else {
            ((n.comment_target - metrics.comment_density) / n.comment_target).clamp(0.0, 1.0)
        };

        let mut smell = metrics
            .smell_score
            .max(saturate(metrics.smell_flags.len() as f64, n.smell_flag_saturation));
        if metrics.longest_line >= n.extreme_line_length {
            smell += n.extreme_line_bonus;
        }

        ScoreComponents {
            heat: heat.clamp(0.0, 1.0),
            complexity: saturate(metrics.max_complexity, n.complexity_saturation),
            maintainability: saturate(
                100.0 - metrics.maintainability_index,
                n.maintainability_span,
            ),
            size,
            comment_scarcity,
            smell: smell.clamp(0.0, 1.0),
        }
    }

    fn risk_flags(
        &self,
        components: &ScoreComponents,
        heat: &HeatBreakdown,
        metrics: &ComplexityStats,
    ) -> BTreeSet<RiskFlag> {
        let r = &self.risk;
        let checks = [
            (RiskFlag::Hotspot, components.heat > r.hotspot),
            (RiskFlag::HighComplexity, components.complexity > r.complexity),
            (
                RiskFlag::LowMaintainability,
                metrics.maintainability_index < r.maintainability_index,
            ),
            (RiskFlag::LargeFile, metrics.lines_of_code > r.large_file_lines),
            (RiskFlag::Undercommented, components.comment_scarcity > r.undercommented),
            (RiskFlag::Smelly, components.smell > r.smelly),
            (RiskFlag::RecentlyModified, heat.recency >= r.recent),
            (RiskFlag::Minified, metrics.is_minified_candidate),
        ];
        checks
            .into_iter()
            .filter_map(|(flag, hit)| hit.then_some(flag))
            .collect()
    }
}

/// `ceil(2 + score * 10 + loc / 250 + avg_complexity / 2)` hours, at least 1.
pub fn estimate_effort(debt_score: f64, lines_of_code: usize, avg_complexity: f64) -> u32 {
    let hours = 2.0 + debt_score * 10.0 + lines_of_code as f64 / 250.0 + avg_complexity / 2.0;
    hours.ceil().max(1.0) as u32
}

/// First high-complexity block, else deep nesting, else long line, else any sample.
pub fn focus_line(metrics: &ComplexityStats) -> Option<u32> {
    [
        SmellKind::HighComplexity,
        SmellKind::DeepNesting,
        SmellKind::LongLine,
    ]
    .into_iter()
    .find_map(|kind| metrics.first_sample(kind))
    .or_else(|| metrics.smell_samples.first())
    .map(|sample| sample.line)
}

fn saturate(value: f64, saturation: f64) -> f64 {
    let ratio = value / saturation;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::history::AuthorId;
    use crate::analyzers::metrics::{AnalysisMode, SmellSample};
    use crate::core::Language;
    use chrono::Duration;

    fn scorer() -> DebtScorer {
        DebtScorer::new(&ScoringConfig::default(), &HeatPolicy::default()).unwrap()
    }

    fn empty_metrics() -> ComplexityStats {
        ComplexityStats {
            language: Language::Python,
            mode: AnalysisMode::Structured,
            function_count: 0,
            avg_complexity: 0.0,
            max_complexity: 0.0,
            total_complexity: 0,
            maintainability_index: 100.0,
            lines_of_code: 0,
            logical_lines: 0,
            comment_lines: 0,
            comment_density: 0.0,
            smell_score: 0.0,
            smell_flags: BTreeSet::new(),
            smell_samples: Vec::new(),
            longest_line: 0,
            long_line_count: 0,
            long_function_count: 0,
            high_complexity_blocks: 0,
            deeply_nested_functions: 0,
            long_parameter_functions: 0,
            complex_conditionals: 0,
            uninformative_identifiers: 0,
            is_minified_candidate: false,
        }
    }

    fn sample(kind: SmellKind, line: u32) -> SmellSample {
        SmellSample {
            kind,
            line,
            snippet: String::new(),
        }
    }

    fn busy_history(now: DateTime<Utc>) -> ChangeStats {
        ChangeStats {
            change_count: 50,
            added_lines: 1500,
            deleted_lines: 500,
            authors: (0..5)
                .map(|i| AuthorId::new(&format!("dev{i}"), &format!("dev{i}@example.com")))
                .collect(),
            last_modified: Some(now),
        }
    }

    #[test]
    fn test_severity_ordering_and_parsing() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("urgent".parse::<Severity>().is_err());
        assert_eq!(Severity::Medium.to_string(), "medium");
    }

    #[test]
    fn test_severity_bands() {
        let s = scorer();
        assert_eq!(s.severity_for(0.0), Severity::Low);
        assert_eq!(s.severity_for(0.199), Severity::Low);
        assert_eq!(s.severity_for(0.2), Severity::Medium);
        assert_eq!(s.severity_for(0.4), Severity::High);
        assert_eq!(s.severity_for(0.6), Severity::Critical);
        assert_eq!(s.severity_for(1.0), Severity::Critical);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut scoring = ScoringConfig::default();
        scoring.weights.heat = 0.5;
        let err = DebtScorer::new(&scoring, &HeatPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidWeights { .. }));
    }

    #[test]
    fn test_invalid_normalization_rejected() {
        let mut scoring = ScoringConfig::default();
        scoring.normalization.complexity_saturation = f64::NAN;
        assert!(DebtScorer::new(&scoring, &HeatPolicy::default()).is_err());
        scoring.normalization.complexity_saturation = 8.0;
        scoring.normalization.smell_flag_saturation = -1.0;
        assert!(DebtScorer::new(&scoring, &HeatPolicy::default()).is_err());
    }

    #[test]
    fn test_saturate_stays_in_unit_interval() {
        assert_eq!(saturate(4.0, 8.0), 0.5);
        assert_eq!(saturate(20.0, 8.0), 1.0);
        assert_eq!(saturate(f64::NAN, 8.0), 0.0);
        assert_eq!(saturate(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let mut scoring = ScoringConfig::default();
        scoring.bands.high = 0.1;
        let err = DebtScorer::new(&scoring, &HeatPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidSeverityBands(_)));
    }

    #[test]
    fn test_empty_file_without_history_is_low() {
        let record = scorer().score(FileKey::new("new.py"), None, empty_metrics(), Utc::now());
        assert!(record.debt_score < 1e-9);
        assert_eq!(record.severity, Severity::Low);
        assert!(record.risk_flags.is_empty());
        assert_eq!(record.focus_line, None);
        assert_eq!(record.change_count, 0);
        assert_eq!(record.estimated_effort, 2);
    }

    #[test]
    fn test_hot_complex_file_is_critical() {
        let now = Utc::now();
        let history = busy_history(now);
        let metrics = ComplexityStats {
            function_count: 12,
            avg_complexity: 20.0,
            max_complexity: 31.0,
            maintainability_index: 40.0,
            lines_of_code: 900,
            logical_lines: 800,
            comment_density: 0.02,
            smell_score: 0.8,
            smell_flags: [SmellKind::HighComplexity, SmellKind::DeepNesting]
                .into_iter()
                .collect(),
            ..empty_metrics()
        };

        let record = scorer().score(FileKey::new("src/core.py"), Some(&history), metrics, now);
        assert_eq!(record.severity, Severity::Critical);
        assert!(record.estimated_effort >= 10);
        assert!((record.score_breakdown.total() - record.debt_score).abs() < 1e-9);
        assert!(record.risk_flags.contains(&RiskFlag::Hotspot));
        assert!(record.risk_flags.contains(&RiskFlag::LowMaintainability));
        assert!(record.risk_flags.contains(&RiskFlag::LargeFile));
        assert!(record.risk_flags.contains(&RiskFlag::Undercommented));
        assert!(record.risk_flags.contains(&RiskFlag::RecentlyModified));
        assert_eq!(record.churn, 2000);
        assert_eq!(record.author_count, 5);
    }

    #[test]
    fn test_components() {
        let metrics = ComplexityStats {
            function_count: 45,
            max_complexity: 4.0,
            maintainability_index: 70.0,
            lines_of_code: 300,
            comment_density: 0.7,
            smell_score: 0.1,
            smell_flags: [SmellKind::LongLine].into_iter().collect(),
            longest_line: 240,
            ..empty_metrics()
        };
        let c = scorer().components(0.3, &metrics);
        assert_eq!(c.heat, 0.3);
        assert_eq!(c.complexity, 0.5);
        assert!((c.maintainability - 0.5).abs() < 1e-12);
        // function count dominates the line count
        assert_eq!(c.size, 1.0);
        assert_eq!(c.comment_scarcity, 0.0);
        // max(0.1, 1/4) + 0.2 extreme line bonus
        assert!((c.smell - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_risk_flags_follow_components_not_score() {
        let metrics = ComplexityStats {
            lines_of_code: 10,
            comment_density: 0.5,
            is_minified_candidate: true,
            ..empty_metrics()
        };
        let record = scorer().score(FileKey::new("app.min.js"), None, metrics, Utc::now());
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(
            record.risk_flags.into_iter().collect::<Vec<_>>(),
            vec![RiskFlag::Minified]
        );
    }

    #[test]
    fn test_stale_history_is_not_recent() {
        let now = Utc::now();
        let mut history = busy_history(now);
        history.last_modified = Some(now - Duration::days(400));
        let record = scorer().score(FileKey::new("old.py"), Some(&history), empty_metrics(), now);
        assert_eq!(record.heat.recency, 0.0);
        assert!(!record.risk_flags.contains(&RiskFlag::RecentlyModified));
        assert!(record.heat.heat > 0.8);
    }

    #[test]
    fn test_estimate_effort() {
        assert_eq!(estimate_effort(0.0, 0, 0.0), 2);
        assert_eq!(estimate_effort(0.5, 500, 3.0), 11);
        assert!(estimate_effort(0.9, 100, 1.0) >= estimate_effort(0.1, 100, 1.0));
    }

    #[test]
    fn test_focus_line_priority() {
        let mut metrics = empty_metrics();
        metrics.smell_samples = vec![
            sample(SmellKind::LongParameterList, 3),
            sample(SmellKind::LongLine, 40),
            sample(SmellKind::DeepNesting, 22),
        ];
        assert_eq!(focus_line(&metrics), Some(22));

        metrics.smell_samples.push(sample(SmellKind::HighComplexity, 9));
        assert_eq!(focus_line(&metrics), Some(9));

        metrics.smell_samples = vec![sample(SmellKind::ComplexConditional, 7)];
        assert_eq!(focus_line(&metrics), Some(7));

        metrics.smell_samples.clear();
        assert_eq!(focus_line(&metrics), None);
    }

    #[test]
    fn test_breakdown_ranked() {
        let breakdown = ScoreBreakdown {
            heat: 0.1,
            smell: 0.2,
            ..ScoreBreakdown::default()
        };
        let ranked = breakdown.ranked();
        assert_eq!(ranked[0], ("smell", 0.2));
        assert_eq!(ranked[1], ("heat", 0.1));
    }

    #[test]
    fn test_record_serializes_lowercase_severity() {
        let record = scorer().score(FileKey::new("a.py"), None, empty_metrics(), Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["severity"], "low");
        assert_eq!(json["file_key"], "a.py");
        assert!(json["focus_line"].is_null());
    }
}
