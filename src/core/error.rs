//! Error types for the debtheat library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using debtheat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during debt analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported language for the given file.
    #[error("Unsupported language for file: {path}")]
    UnsupportedLanguage { path: PathBuf },

    /// Parse error from tree-sitter.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// File content is binary or too garbled to analyze.
    #[error("Binary or garbled content in {path}")]
    BinaryContent { path: PathBuf },

    /// Git operation error.
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scoring weights do not sum to one.
    #[error("Scoring weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    /// Severity bands are not ordered inside [0, 1].
    #[error("Invalid severity bands: {0}")]
    InvalidSeverityBands(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Self::Git(err.message().to_string())
    }
}

impl Error {
    /// Create a new git error.
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is a configuration invariant violation.
    ///
    /// These are the only errors allowed to abort a whole analysis run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidWeights { .. } | Self::InvalidSeverityBands(_)
        )
    }
}
