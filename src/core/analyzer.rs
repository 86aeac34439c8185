//! Analyzer trait and common types.

use std::path::Path;

use super::{FileSet, Result};
use crate::config::Config;

/// Trait implemented by the project-wide analysis passes.
///
/// Passes are read-only over the context, so independent passes may run
/// concurrently against the same context.
pub trait Analyzer: Send + Sync {
    /// The result type produced by this analyzer.
    type Output: Send;

    /// Pass name used in log events.
    fn name(&self) -> &'static str;

    /// Run the pass over every file in the context.
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Self::Output>;
}

/// Context shared by all analyzers during analysis.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    /// Root directory being analyzed (canonical).
    pub root: &'a Path,
    /// Set of files to analyze.
    pub files: &'a FileSet,
    /// Configuration.
    pub config: &'a Config,
}

impl<'a> AnalysisContext<'a> {
    /// Create a new analysis context rooted at the file set's root.
    pub fn new(files: &'a FileSet, config: &'a Config) -> Self {
        Self {
            root: files.root(),
            files,
            config,
        }
    }
}
