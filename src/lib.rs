//! Debtheat - technical debt scoring from change history and static metrics.
//!
//! Each source file gets a debt score in [0, 1] fused from a history "heat"
//! signal (change frequency, churn, authors, recency) and static signals
//! (complexity, maintainability, size, comment scarcity, smells), with a
//! severity band, an effort estimate, risk flags and a focus line.
//!
//! # Supported Languages
//!
//! Structured: Go, Rust, Python, TypeScript, JavaScript, TSX/JSX, Java, C, C++,
//! C#, Ruby, PHP, Bash. Heuristic: Kotlin, Swift, Scala, Lua, Dart, Vue,
//! Svelte, CSS/SCSS, HTML, JSON, source maps.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use debtheat::config::Config;
//! use debtheat::orchestrator::AnalysisOrchestrator;
//!
//! let orchestrator = AnalysisOrchestrator::new(Config::default()).unwrap();
//! let report = orchestrator.analyze_directory(Path::new(".")).unwrap();
//! for record in report.ranked().iter().take(10) {
//!     println!("{:.2} {} {}", record.debt_score, record.severity, record.file_key);
//! }
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod git;
pub mod orchestrator;
pub mod output;
pub mod parser;

pub use core::{AnalysisContext, Analyzer, FileKey};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome};
