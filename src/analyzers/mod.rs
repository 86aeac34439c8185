//! Analysis passes: history mining, static metrics and debt scoring.

pub mod debt;
pub mod history;
pub mod metrics;

pub use debt::{DebtRecord, DebtScorer, RiskFlag, Severity};
pub use history::{ChangeStats, HeatBreakdown, HistoryIndex, HistoryMiner};
pub use metrics::{AnalysisMode, ComplexityStats, StaticAnalyzer};
