//! Configuration loading and management.
//!
//! Every policy constant used by the history miner, the static analyzer and
//! the debt scorer lives here, so tuning never touches algorithmic code.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Tolerance used when checking that weights sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclude patterns (glob, relative to the analysis root).
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
    /// Worker pool size for per-file analysis. Defaults to host parallelism.
    pub jobs: Option<usize>,
    /// History mining configuration.
    pub history: HistoryConfig,
    /// Static analysis thresholds.
    pub thresholds: StaticThresholds,
    /// Debt scoring policy.
    pub scoring: ScoringConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `DEBTHEAT_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("DEBTHEAT_").split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from directory, looking for debtheat.toml or
    /// .debtheat/debtheat.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `DEBTHEAT_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("debtheat.toml")))
            .merge(Toml::file(dir.join(".debtheat/debtheat.toml")))
            .merge(Env::prefixed("DEBTHEAT_").split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }

    /// Check every configuration-level invariant.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(Error::config("jobs must be at least 1"));
        }
        self.history.heat.validate()?;
        self.thresholds.validate()?;
        self.scoring.weights.validate()?;
        self.scoring.bands.validate()?;
        self.scoring.normalization.validate()?;
        self.scoring.risk.validate()?;
        Ok(())
    }
}

/// History mining configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// File extensions to mine. `None` means every source language.
    pub extensions: Option<Vec<String>>,
    /// Stop after this many commits (newest first). `None` walks everything.
    pub max_commits: Option<usize>,
    /// Heat score curve parameters.
    pub heat: HeatPolicy,
}

/// Saturation points and recency windows for the heat score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatPolicy {
    /// Commit count at which the change component reaches 1.
    pub change_saturation: f64,
    /// Added plus deleted lines at which the churn component reaches 1.
    pub churn_saturation: f64,
    /// Distinct authors at which the author component reaches 1.
    pub author_saturation: f64,
    /// Files modified within this many days score full recency.
    pub recency_short_days: f64,
    /// Files untouched for this many days score zero recency.
    pub recency_long_days: f64,
}

impl Default for HeatPolicy {
    fn default() -> Self {
        Self {
            change_saturation: 10.0,
            churn_saturation: 800.0,
            author_saturation: 4.0,
            recency_short_days: 7.0,
            recency_long_days: 180.0,
        }
    }
}

impl HeatPolicy {
    fn validate(&self) -> Result<()> {
        let saturations = [
            self.change_saturation,
            self.churn_saturation,
            self.author_saturation,
        ];
        if saturations.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::config("heat saturation points must be positive"));
        }
        if !(self.recency_short_days >= 0.0 && self.recency_short_days < self.recency_long_days)
        {
            return Err(Error::config(
                "recency_short_days must be non-negative and below recency_long_days",
            ));
        }
        Ok(())
    }
}

/// Thresholds for the static analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticThresholds {
    /// Line length (characters) considered long.
    pub long_line: usize,
    /// Long line threshold for verbose languages.
    pub verbose_long_line: usize,
    /// Logical lines at which a function is long.
    pub long_function_lines: usize,
    /// Cyclomatic complexity at which a function is a high-complexity block.
    pub high_complexity: u32,
    /// Nesting depth at which a function is deeply nested.
    pub max_nesting: u32,
    /// Parameter count above which a function has a long parameter list.
    pub max_parameters: usize,
    /// Boolean operators in one condition at which it is complex.
    pub max_boolean_operators: usize,
    /// Identifiers shorter than this are uninformative unless allow-listed.
    pub min_identifier_length: usize,
    /// Distinct uninformative identifiers needed to raise the smell.
    pub uninformative_identifier_limit: usize,
    /// Longest-line length that marks a minified candidate.
    pub minified_line_length: usize,
    /// Average characters per line that marks a minified candidate.
    pub minified_avg_line_length: usize,
    /// Recorded samples per smell kind.
    pub max_samples_per_kind: usize,
    /// Files larger than this (bytes) skip structured parsing.
    pub max_structured_file_size: usize,
    /// Share of a file covered by syntax errors above which the generic
    /// backend takes over.
    pub max_parse_error_ratio: f64,
}

impl Default for StaticThresholds {
    fn default() -> Self {
        Self {
            long_line: 120,
            verbose_long_line: 180,
            long_function_lines: 80,
            high_complexity: 10,
            max_nesting: 4,
            max_parameters: 5,
            max_boolean_operators: 3,
            min_identifier_length: 2,
            uninformative_identifier_limit: 3,
            minified_line_length: 300,
            minified_avg_line_length: 150,
            max_samples_per_kind: 5,
            max_structured_file_size: 1_000_000,
            max_parse_error_ratio: 0.25,
        }
    }
}

impl StaticThresholds {
    fn validate(&self) -> Result<()> {
        if self.max_samples_per_kind == 0 {
            return Err(Error::config("max_samples_per_kind must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.max_parse_error_ratio) {
            return Err(Error::config("max_parse_error_ratio must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Debt scoring policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Component weights of the fused score.
    pub weights: Weights,
    /// Severity band boundaries.
    pub bands: SeverityBands,
    /// Normalization of raw metrics into [0, 1] components.
    pub normalization: Normalization,
    /// Sub-thresholds for risk flags.
    pub risk: RiskThresholds,
}

/// Weights of the fused debt score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub heat: f64,
    pub complexity: f64,
    pub maintainability: f64,
    pub size: f64,
    pub comment_scarcity: f64,
    pub smell: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            heat: 0.30,
            complexity: 0.20,
            maintainability: 0.15,
            size: 0.10,
            comment_scarcity: 0.05,
            smell: 0.20,
        }
    }
}

impl Weights {
    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.heat
            + self.complexity
            + self.maintainability
            + self.size
            + self.comment_scarcity
            + self.smell
    }

    /// Reject negative weights and weights that do not sum to one.
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.heat,
            self.complexity,
            self.maintainability,
            self.size,
            self.comment_scarcity,
            self.smell,
        ];
        let sum = self.sum();
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) || (sum - 1.0).abs() > WEIGHT_TOLERANCE
        {
            return Err(Error::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Lower bounds of the `medium`, `high` and `critical` bands; `low` starts at 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            medium: 0.2,
            high: 0.4,
            critical: 0.6,
        }
    }
}

impl SeverityBands {
    /// Bands must be strictly increasing inside (0, 1].
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 < self.medium
            && self.medium < self.high
            && self.high < self.critical
            && self.critical <= 1.0;
        if !ordered {
            return Err(Error::InvalidSeverityBands(format!(
                "expected 0 < medium < high < critical <= 1, got {} / {} / {}",
                self.medium, self.high, self.critical
            )));
        }
        Ok(())
    }
}

/// Raw metric normalizers for the debt components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalization {
    /// Max function complexity at which the complexity component saturates.
    pub complexity_saturation: f64,
    /// Maintainability index drop from 100 at which the component saturates.
    pub maintainability_span: f64,
    /// Lines at which the size component saturates.
    pub loc_saturation: f64,
    /// Function count at which the size component saturates.
    pub function_saturation: f64,
    /// Comment density at or above which comment scarcity is zero.
    pub comment_target: f64,
    /// Active smell flags at which the smell component saturates.
    pub smell_flag_saturation: f64,
    /// Longest line that adds the extreme-line bonus to the smell component.
    pub extreme_line_length: usize,
    /// Bonus added to the smell component for extreme lines.
    pub extreme_line_bonus: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            complexity_saturation: 8.0,
            maintainability_span: 60.0,
            loc_saturation: 600.0,
            function_saturation: 30.0,
            comment_target: 0.35,
            smell_flag_saturation: 4.0,
            extreme_line_length: 220,
            extreme_line_bonus: 0.2,
        }
    }
}

impl Normalization {
    pub fn validate(&self) -> Result<()> {
        let divisors = [
            self.complexity_saturation,
            self.maintainability_span,
            self.loc_saturation,
            self.function_saturation,
            self.comment_target,
            self.smell_flag_saturation,
        ];
        if divisors.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(Error::config("normalization saturation points must be positive"));
        }
        if !(0.0..=1.0).contains(&self.extreme_line_bonus) {
            return Err(Error::config("extreme_line_bonus must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Sub-thresholds for individual risk flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Heat component above which a file is a hotspot.
    pub hotspot: f64,
    /// Complexity component above which complexity is flagged.
    pub complexity: f64,
    /// Maintainability index below which maintainability is flagged.
    pub maintainability_index: f64,
    /// Line count above which a file is large.
    pub large_file_lines: usize,
    /// Comment scarcity above which a file is undercommented.
    pub undercommented: f64,
    /// Smell component above which a file is smelly.
    pub smelly: f64,
    /// Recency score at or above which a file was recently modified.
    pub recent: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            hotspot: 0.6,
            complexity: 0.6,
            maintainability_index: 65.0,
            large_file_lines: 800,
            undercommented: 0.5,
            smelly: 0.5,
            recent: 0.8,
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            self.hotspot,
            self.complexity,
            self.maintainability_index,
            self.undercommented,
            self.smelly,
            self.recent,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::config("risk thresholds must be finite and non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds.long_line, 120);
        assert_eq!(config.thresholds.max_nesting, 4);
        assert!(config.jobs.is_none());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((Weights::default().sum() - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let weights = Weights {
            heat: 0.5,
            ..Weights::default()
        };
        match weights.validate() {
            Err(Error::InvalidWeights { sum }) => assert!((sum - 1.2).abs() < 1e-9),
            other => panic!("expected InvalidWeights, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = Weights {
            heat: 0.5,
            smell: 0.0,
            comment_scarcity: -0.15,
            ..Weights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let bands = SeverityBands {
            medium: 0.5,
            high: 0.4,
            critical: 0.6,
        };
        assert!(matches!(
            bands.validate(),
            Err(Error::InvalidSeverityBands(_))
        ));
        let bands = SeverityBands {
            medium: 0.2,
            high: 0.4,
            critical: 1.5,
        };
        assert!(bands.validate().is_err());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let config = Config {
            jobs: Some(0),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_inverted_recency_window_rejected() {
        let mut config = Config::default();
        config.history.heat.recency_short_days = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_normalization_from_file_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "debtheat.toml",
                "[scoring.normalization]\ncomplexity_saturation = nan",
            )?;
            let config = Config::from_file("debtheat.toml").unwrap();
            assert!(config.scoring.normalization.complexity_saturation.is_nan());
            assert!(config.validate().unwrap_err().is_configuration());
            Ok(())
        });
    }

    #[test]
    fn test_negative_normalization_and_risk_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "debtheat.toml",
                "[scoring.normalization]\nloc_saturation = -600.0",
            )?;
            let config = Config::from_file("debtheat.toml").unwrap();
            assert!(config.validate().unwrap_err().is_configuration());
            Ok(())
        });

        let mut config = Config::default();
        config.scoring.risk.hotspot = f64::INFINITY;
        assert!(config.validate().is_err());
        config.scoring.risk.hotspot = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_cap_must_be_positive() {
        let mut config = Config::default();
        config.thresholds.max_samples_per_kind = 0;
        assert!(config.validate().unwrap_err().is_configuration());
        config.thresholds.max_samples_per_kind = 1;
        config.thresholds.max_parse_error_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "debtheat.toml",
                "jobs = 2\n[thresholds]\nlong_line = 100\n[scoring.bands]\nmedium = 0.1",
            )?;
            let config = Config::from_file("debtheat.toml").unwrap();
            assert_eq!(config.jobs, Some(2));
            assert_eq!(config.thresholds.long_line, 100);
            assert_eq!(config.thresholds.verbose_long_line, 180);
            assert!((config.scoring.bands.medium - 0.1).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_dot_dir() {
        Jail::expect_with(|jail| {
            std::fs::create_dir(jail.directory().join(".debtheat")).unwrap();
            jail.create_file(
                ".debtheat/debtheat.toml",
                "[history]\nextensions = [\"py\"]\nmax_commits = 500",
            )?;
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.history.extensions, Some(vec!["py".to_string()]));
            assert_eq!(config.history.max_commits, Some(500));
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_no_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.thresholds.long_function_lines, 80);
            Ok(())
        });
    }

    #[test]
    fn test_from_file_errors_on_missing_file() {
        let result = Config::from_file("/nonexistent/path/debtheat.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "expected 'not found' in: {err}");
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("debtheat.toml", "[thresholds]\nmax_nesting = 6")?;
            jail.set_env("DEBTHEAT_THRESHOLDS__MAX_NESTING", "3");
            let config = Config::from_file("debtheat.toml").unwrap();
            assert_eq!(config.thresholds.max_nesting, 3);
            Ok(())
        });
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("debtheat.toml", Config::default_toml())?;
            let config = Config::from_file("debtheat.toml").unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(config.scoring.weights, Weights::default());
            assert_eq!(config.scoring.bands, SeverityBands::default());
            assert_eq!(config.thresholds.long_line, 120);
            Ok(())
        });
    }

    #[test]
    fn test_config_with_exclude_patterns() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "debtheat.toml",
                "exclude = [\"generated/**\", \"**/*.pb.go\"]",
            )?;
            let config = Config::from_file("debtheat.toml").unwrap();
            assert_eq!(config.exclude_patterns.len(), 2);
            Ok(())
        });
    }
}
