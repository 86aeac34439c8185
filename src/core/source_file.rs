//! Source file representation.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::{Error, Language, Result};

/// Bytes inspected for a NUL when sniffing binary content.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Share of replacement characters above which text is considered garbled.
const MAX_REPLACEMENT_RATIO: f64 = 0.10;

/// A source file with its content loaded.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,
    /// Detected language.
    pub language: Language,
    /// File content as bytes.
    pub content: Vec<u8>,
}

impl SourceFile {
    /// Load a source file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let language = Language::detect(path).ok_or_else(|| Error::UnsupportedLanguage {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            language,
            content,
        })
    }

    /// Create from existing content.
    pub fn from_content(path: impl Into<PathBuf>, language: Language, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            language,
            content,
        }
    }

    /// Get content as string (lossy conversion).
    pub fn content_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Decode the content as text, rejecting binary or garbled files.
    pub fn text(&self) -> Result<Cow<'_, str>> {
        let sniff = &self.content[..self.content.len().min(BINARY_SNIFF_LEN)];
        if sniff.contains(&0) {
            return Err(Error::BinaryContent {
                path: self.path.clone(),
            });
        }

        let text = self.content_str();
        if let Cow::Owned(ref decoded) = text {
            let total = decoded.chars().count().max(1);
            let replaced = decoded.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count();
            if replaced as f64 / total as f64 > MAX_REPLACEMENT_RATIO {
                return Err(Error::BinaryContent {
                    path: self.path.clone(),
                });
            }
        }
        Ok(text)
    }

    /// File name in lowercase, used for name-based generated-file checks.
    pub fn file_name_lower(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}
