//! Diagnostic records emitted while analyzing a project.

use serde::Serialize;

use crate::analyzers::debt::Severity;

/// One observability record for a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Normalized file key, or the repository root for run-level records.
    pub file_path: String,
    /// Debt score when the file was scored.
    pub debt_score: Option<f64>,
    /// Severity when the file was scored.
    pub severity: Option<Severity>,
    /// Human-readable detail.
    pub detail: String,
}

impl Diagnostic {
    /// Record for a scored file.
    pub fn scored(file_path: impl Into<String>, debt_score: f64, severity: Severity) -> Self {
        Self {
            file_path: file_path.into(),
            debt_score: Some(debt_score),
            severity: Some(severity),
            detail: "scored".to_string(),
        }
    }

    /// Record for a degraded or failed step.
    pub fn note(file_path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            debt_score: None,
            severity: None,
            detail: detail.into(),
        }
    }
}

/// Receiver for diagnostic records.
///
/// Implementations must not block and cannot fail the analysis.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic);
}

/// Sink that forwards records as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        match (diagnostic.debt_score, diagnostic.severity) {
            (Some(score), Some(severity)) => tracing::debug!(
                file_path = %diagnostic.file_path,
                debt_score = score,
                severity = %severity,
                detail = %diagnostic.detail,
                "debt record"
            ),
            _ => tracing::warn!(
                file_path = %diagnostic.file_path,
                detail = %diagnostic.detail,
                "analysis diagnostic"
            ),
        }
    }
}

/// Sink that drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _diagnostic: &Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_record() {
        let d = Diagnostic::scored("src/a.py", 0.42, Severity::High);
        assert_eq!(d.debt_score, Some(0.42));
        assert_eq!(d.severity, Some(Severity::High));
    }

    #[test]
    fn test_note_serializes_without_score() {
        let d = Diagnostic::note("src/b.js", "binary content");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["file_path"], "src/b.js");
        assert!(json["debt_score"].is_null());
        assert_eq!(json["detail"], "binary content");
    }

    #[test]
    fn test_sinks_accept_records() {
        let d = Diagnostic::note("x", "y");
        TracingSink.record(&d);
        NullSink.record(&d);
    }
}
