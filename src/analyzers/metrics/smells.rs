//! Smell bookkeeping shared by the structured and generic backends.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Maximum characters kept in a sample snippet.
pub const SNIPPET_LEN: usize = 120;

/// Heuristically detected code-quality anti-patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmellKind {
    HighComplexity,
    DeepNesting,
    LongFunction,
    LongParameterList,
    ComplexConditional,
    LongLine,
    UninformativeIdentifier,
}

impl SmellKind {
    /// Contribution of an active flag to the smell score.
    pub fn weight(self) -> f64 {
        match self {
            Self::HighComplexity => 0.25,
            Self::DeepNesting => 0.20,
            Self::LongFunction => 0.20,
            Self::LongParameterList => 0.15,
            Self::ComplexConditional => 0.15,
            Self::LongLine => 0.10,
            Self::UninformativeIdentifier => 0.10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighComplexity => "high-complexity",
            Self::DeepNesting => "deep-nesting",
            Self::LongFunction => "long-function",
            Self::LongParameterList => "long-parameter-list",
            Self::ComplexConditional => "complex-conditional",
            Self::LongLine => "long-line",
            Self::UninformativeIdentifier => "uninformative-identifier",
        }
    }
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A representative location for a smell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellSample {
    pub kind: SmellKind,
    /// 1-indexed line.
    pub line: u32,
    /// Trimmed source text, truncated.
    pub snippet: String,
}

/// Accumulates smell samples with a per-kind cap.
#[derive(Debug, Clone)]
pub struct SmellCollector {
    max_per_kind: usize,
    per_kind: BTreeMap<SmellKind, usize>,
    samples: Vec<SmellSample>,
    active: BTreeSet<SmellKind>,
}

impl SmellCollector {
    pub fn new(max_per_kind: usize) -> Self {
        Self {
            max_per_kind,
            per_kind: BTreeMap::new(),
            samples: Vec::new(),
            active: BTreeSet::new(),
        }
    }

    /// Record an occurrence; the sample is kept only while under the cap.
    pub fn record(&mut self, kind: SmellKind, line: u32, source_line: &str) {
        self.active.insert(kind);
        let seen = self.per_kind.entry(kind).or_insert(0);
        if *seen < self.max_per_kind {
            *seen += 1;
            self.samples.push(SmellSample {
                kind,
                line,
                snippet: snippet(source_line),
            });
        }
    }

    /// Weighted count of active flags, capped at 1.
    pub fn score(&self) -> f64 {
        self.active
            .iter()
            .map(|kind| kind.weight())
            .sum::<f64>()
            .min(1.0)
    }

    pub fn into_parts(self) -> (f64, BTreeSet<SmellKind>, Vec<SmellSample>) {
        let score = self.score();
        (score, self.active, self.samples)
    }
}

/// Trim and truncate a source line on a character boundary.
pub fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Line length statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineLengths {
    pub longest: usize,
    pub long_count: usize,
}

/// Measure line lengths in characters and record long lines.
pub fn scan_long_lines(lines: &[&str], threshold: usize, smells: &mut SmellCollector) -> LineLengths {
    let mut stats = LineLengths::default();
    for (idx, line) in lines.iter().enumerate() {
        let len = line.chars().count();
        stats.longest = stats.longest.max(len);
        if len >= threshold {
            stats.long_count += 1;
            smells.record(SmellKind::LongLine, idx as u32 + 1, line);
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_capped_per_kind() {
        let mut smells = SmellCollector::new(2);
        for line in 1..=5 {
            smells.record(SmellKind::LongLine, line, "x");
        }
        smells.record(SmellKind::DeepNesting, 9, "if a:");
        let (_, flags, samples) = smells.into_parts();
        assert_eq!(samples.len(), 3);
        assert_eq!(flags.len(), 2);
        assert_eq!(samples[2].line, 9);
    }

    #[test]
    fn test_score_is_capped() {
        let mut smells = SmellCollector::new(1);
        for kind in [
            SmellKind::HighComplexity,
            SmellKind::DeepNesting,
            SmellKind::LongFunction,
            SmellKind::LongParameterList,
            SmellKind::ComplexConditional,
            SmellKind::LongLine,
            SmellKind::UninformativeIdentifier,
        ] {
            smells.record(kind, 1, "");
        }
        assert_eq!(smells.score(), 1.0);
        assert_eq!(SmellCollector::new(1).score(), 0.0);
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_LEN + 3);
        assert_eq!(snippet("   short  "), "short");
    }

    #[test]
    fn test_scan_long_lines() {
        let mut smells = SmellCollector::new(5);
        let long = "x".repeat(130);
        let lines = ["short", long.as_str(), ""];
        let stats = scan_long_lines(&lines, 120, &mut smells);
        assert_eq!(stats.longest, 130);
        assert_eq!(stats.long_count, 1);
        let (_, _, samples) = smells.into_parts();
        assert_eq!(samples[0].line, 2);
    }
}
