use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use debtheat::analyzers::debt::{estimate_effort, DebtScorer, Severity};
use debtheat::analyzers::history::{AuthorId, ChangeStats, HeatBreakdown};
use debtheat::analyzers::metrics::{
    is_minified_candidate, AnalysisMode, ComplexityStats, SmellKind, StaticAnalyzer,
};
use debtheat::config::{HeatPolicy, ScoringConfig, StaticThresholds, Weights};
use debtheat::core::{normalize, FileKey, Language};

fn scorer() -> DebtScorer {
    DebtScorer::new(&ScoringConfig::default(), &HeatPolicy::default()).unwrap()
}

fn smell_kinds() -> impl Strategy<Value = BTreeSet<SmellKind>> {
    prop::collection::btree_set(
        prop_oneof![
            Just(SmellKind::HighComplexity),
            Just(SmellKind::DeepNesting),
            Just(SmellKind::LongFunction),
            Just(SmellKind::LongParameterList),
            Just(SmellKind::ComplexConditional),
            Just(SmellKind::LongLine),
            Just(SmellKind::UninformativeIdentifier),
        ],
        0..7,
    )
}

prop_compose! {
    fn metrics()(
        function_count in 0usize..200,
        avg in 0.0f64..60.0,
        extra in 0.0f64..60.0,
        mi in 0.0f64..=100.0,
        loc in 0usize..20_000,
        density in 0.0f64..=1.0,
        smell_score in 0.0f64..=1.0,
        smell_flags in smell_kinds(),
        longest_line in 0usize..2_000,
        minified in any::<bool>(),
    ) -> ComplexityStats {
        ComplexityStats {
            language: Language::Python,
            mode: AnalysisMode::Structured,
            function_count,
            avg_complexity: avg,
            max_complexity: avg + extra,
            total_complexity: 0,
            maintainability_index: mi,
            lines_of_code: loc,
            logical_lines: loc,
            comment_lines: 0,
            comment_density: density,
            smell_score,
            smell_flags,
            smell_samples: Vec::new(),
            longest_line,
            long_line_count: 0,
            long_function_count: 0,
            high_complexity_blocks: 0,
            deeply_nested_functions: 0,
            long_parameter_functions: 0,
            complex_conditionals: 0,
            uninformative_identifiers: 0,
            is_minified_candidate: minified,
        }
    }
}

prop_compose! {
    fn history()(
        change_count in 0u32..100_000,
        added in 0u64..10_000_000,
        deleted in 0u64..10_000_000,
        authors in 0usize..200,
        age_days in prop::option::of(-30i64..5_000),
    ) -> ChangeStats {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ChangeStats {
            change_count,
            added_lines: added,
            deleted_lines: deleted,
            authors: (0..authors)
                .map(|i| AuthorId::new(&format!("dev{i}"), &format!("dev{i}@example.com")))
                .collect(),
            last_modified: age_days.map(|d| now - Duration::days(d)),
        }
    }
}

proptest! {
    /// The debt score is bounded and the breakdown sums to it.
    #[test]
    fn debt_score_bounded_and_breakdown_sums(
        stats in metrics(),
        hist in prop::option::of(history()),
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = scorer().score(FileKey::new("a.py"), hist.as_ref(), stats, now);
        prop_assert!((0.0..=1.0).contains(&record.debt_score));
        prop_assert!((record.score_breakdown.total() - record.debt_score).abs() < 1e-9);
        prop_assert!(record.estimated_effort >= 1);
        prop_assert_eq!(record.severity, scorer().severity_for(record.debt_score));
    }

    /// Heat never exceeds one, whatever the history volume.
    #[test]
    fn heat_saturates(hist in history()) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let heat = HeatBreakdown::compute(Some(&hist), &HeatPolicy::default(), now);
        for value in [heat.change, heat.churn, heat.authors, heat.recency, heat.heat] {
            prop_assert!((0.0..=1.0).contains(&value), "component out of range: {}", value);
        }
    }

    /// Severity is monotonic in the score.
    #[test]
    fn severity_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let s = scorer();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(s.severity_for(lo) <= s.severity_for(hi));
    }

    /// Effort never decreases as score or size grows.
    #[test]
    fn effort_monotonic(
        score in 0.0f64..=1.0,
        delta in 0.0f64..=1.0,
        loc in 0usize..50_000,
        more in 0usize..50_000,
        avg in 0.0f64..50.0,
    ) {
        let higher = (score + delta).min(1.0);
        prop_assert!(estimate_effort(higher, loc, avg) >= estimate_effort(score, loc, avg));
        prop_assert!(estimate_effort(score, loc + more, avg) >= estimate_effort(score, loc, avg));
    }

    /// Normalization is idempotent and ignores case and separator style.
    #[test]
    fn file_key_normalization(segments in prop::collection::vec("[A-Za-z0-9_.-]{1,8}", 1..6)) {
        let forward = segments.join("/");
        let backward = segments.join("\\");
        let once = normalize(&forward);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert_eq!(normalize(&backward), once.clone());
        prop_assert_eq!(normalize(&forward.to_uppercase()), once.clone());
        let backward_key = FileKey::new(&backward);
        prop_assert_eq!(backward_key.as_str(), once.as_str());
    }

    /// Generated formats are always minified candidates, whatever they hold.
    #[test]
    fn generated_formats_always_minified(text in ".{0,400}", json in any::<bool>()) {
        let (name, language) = if json {
            ("data.json", Language::Json)
        } else {
            ("bundle.js.map", Language::SourceMap)
        };
        prop_assert!(is_minified_candidate(name, language, &text, &StaticThresholds::default()));
    }

    /// Weights that sum to one validate; perturbed weights do not.
    #[test]
    fn weight_invariant(raw in prop::collection::vec(0.01f64..1.0, 6), bump in 0.001f64..0.5) {
        let total: f64 = raw.iter().sum();
        let w: Vec<f64> = raw.iter().map(|x| x / total).collect();
        let mut weights = Weights {
            heat: w[0],
            complexity: w[1],
            maintainability: w[2],
            size: w[3],
            comment_scarcity: w[4],
            smell: 1.0 - (w[0] + w[1] + w[2] + w[3] + w[4]),
        };
        prop_assert!(weights.validate().is_ok());
        weights.smell += bump;
        prop_assert!(weights.validate().is_err());
    }

    /// Static metrics respect their documented ranges for arbitrary Python.
    #[test]
    fn static_metrics_within_bounds(
        body in prop::collection::vec(
            prop_oneof![
                Just("x = 1\n"),
                Just("# note\n"),
                Just("if x and y:\n    pass\n"),
                Just("for i in range(10):\n    pass\n"),
                Just("def f(a, b):\n    return a or b\n"),
                Just("class C:\n    def m(self):\n        return 0\n"),
                Just("\n"),
            ],
            0..12,
        )
    ) {
        let code = body.join("");
        let stats = StaticAnalyzer::default()
            .analyze_content("gen.py", code.into_bytes())
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&stats.comment_density));
        prop_assert!((0.0..=1.0).contains(&stats.smell_score));
        prop_assert!((0.0..=100.0).contains(&stats.maintainability_index));
        prop_assert!(stats.max_complexity >= stats.avg_complexity);
        prop_assert!(stats.smell_samples.len() <= 5 * 7);
    }
}

#[test]
fn default_weights_sum_to_one() {
    assert!((Weights::default().sum() - 1.0).abs() < 1e-12);
}

#[test]
fn critical_scenario() {
    let now = Utc::now();
    let history = ChangeStats {
        change_count: 50,
        added_lines: 1200,
        deleted_lines: 800,
        authors: (0..5)
            .map(|i| AuthorId::new(&format!("dev{i}"), "dev@example.com"))
            .collect(),
        last_modified: Some(now),
    };
    let metrics = ComplexityStats {
        language: Language::Python,
        mode: AnalysisMode::Structured,
        function_count: 10,
        avg_complexity: 20.0,
        max_complexity: 20.0,
        total_complexity: 200,
        maintainability_index: 40.0,
        lines_of_code: 900,
        logical_lines: 850,
        comment_lines: 18,
        comment_density: 0.02,
        smell_score: 0.8,
        smell_flags: BTreeSet::new(),
        smell_samples: Vec::new(),
        longest_line: 100,
        long_line_count: 0,
        long_function_count: 0,
        high_complexity_blocks: 0,
        deeply_nested_functions: 0,
        long_parameter_functions: 0,
        complex_conditionals: 0,
        uninformative_identifiers: 0,
        is_minified_candidate: false,
    };
    let record = scorer().score(FileKey::new("hot.py"), Some(&history), metrics, now);
    assert_eq!(record.severity, Severity::Critical);
    assert!(record.estimated_effort >= 10);
}
