//! Core types shared by the analyzers.

mod analyzer;
pub mod diagnostics;
mod error;
mod file_key;
mod file_set;
mod language;
mod source_file;

pub use analyzer::{AnalysisContext, Analyzer};
pub use diagnostics::{Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use error::{Error, Result};
pub use file_key::{normalize, FileKey};
pub use file_set::{
    build_exclude_set, is_excluded_dir, is_excluded_path, Eligibility, Exclusion, FileSet,
    EXCLUDED_DIRS,
};
pub use language::{Backend, CommentSyntax, Language};
pub use source_file::SourceFile;
