//! Language detection and backend dispatch.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Recognized languages and file formats.
///
/// The first group has a tree-sitter grammar and is analyzed structurally; the
/// rest are handled by the generic heuristic backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Tsx,
    Jsx,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Bash,
    Kotlin,
    Swift,
    Scala,
    Lua,
    Dart,
    Vue,
    Svelte,
    Css,
    Scss,
    Html,
    Json,
    SourceMap,
}

/// Analysis backend selected for a file.
///
/// Adding a language means adding a variant to [`Language`] plus its rule
/// tables, never a new analyzer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Grammar-aware parsing through tree-sitter.
    Structured(Language),
    /// Line and token heuristics.
    Generic(Language),
}

impl Backend {
    /// Language this backend analyzes.
    pub fn language(&self) -> Language {
        match self {
            Self::Structured(lang) | Self::Generic(lang) => *lang,
        }
    }
}

/// Comment syntax used by the generic backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    /// Line comment prefixes.
    pub line: &'static [&'static str],
    /// Block comment delimiters.
    pub block: &'static [(&'static str, &'static str)],
}

const C_STYLE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
};

impl Language {
    /// Detect language from file path based on extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::from_extension(extension)
    }

    /// Get language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "tsx" => Some(Self::Tsx),
            "jsx" => Some(Self::Jsx),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            "rb" | "rake" | "gemspec" => Some(Self::Ruby),
            "php" => Some(Self::Php),
            "sh" | "bash" => Some(Self::Bash),
            "kt" | "kts" => Some(Self::Kotlin),
            "swift" => Some(Self::Swift),
            "scala" | "sc" => Some(Self::Scala),
            "lua" => Some(Self::Lua),
            "dart" => Some(Self::Dart),
            "vue" => Some(Self::Vue),
            "svelte" => Some(Self::Svelte),
            "css" => Some(Self::Css),
            "scss" | "sass" | "less" => Some(Self::Scss),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "map" => Some(Self::SourceMap),
            _ => None,
        }
    }

    /// Select the analysis backend for this language.
    pub fn backend(self) -> Backend {
        match self {
            Self::Go
            | Self::Rust
            | Self::Python
            | Self::TypeScript
            | Self::JavaScript
            | Self::Tsx
            | Self::Jsx
            | Self::Java
            | Self::C
            | Self::Cpp
            | Self::CSharp
            | Self::Ruby
            | Self::Php
            | Self::Bash => Backend::Structured(self),
            _ => Backend::Generic(self),
        }
    }

    /// Get the display name for the language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::TypeScript => "TypeScript",
            Self::JavaScript => "JavaScript",
            Self::Tsx => "TSX",
            Self::Jsx => "JSX",
            Self::Java => "Java",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
            Self::Bash => "Bash",
            Self::Kotlin => "Kotlin",
            Self::Swift => "Swift",
            Self::Scala => "Scala",
            Self::Lua => "Lua",
            Self::Dart => "Dart",
            Self::Vue => "Vue",
            Self::Svelte => "Svelte",
            Self::Css => "CSS",
            Self::Scss => "SCSS",
            Self::Html => "HTML",
            Self::Json => "JSON",
            Self::SourceMap => "Source map",
        }
    }

    /// Whether files of this kind are program source rather than markup or data.
    ///
    /// Only source files take part in history mining by default.
    pub fn is_source(&self) -> bool {
        !matches!(
            self,
            Self::Css | Self::Scss | Self::Html | Self::Json | Self::SourceMap
        )
    }

    /// Formats that are generated by tooling and always treated as minified.
    pub fn is_generated_format(&self) -> bool {
        matches!(self, Self::Json | Self::SourceMap)
    }

    /// Languages whose idiomatic lines run long enough to warrant a looser
    /// line-length threshold.
    pub fn is_verbose(&self) -> bool {
        matches!(
            self,
            Self::Java | Self::CSharp | Self::Kotlin | Self::Html | Self::Vue | Self::Svelte
        )
    }

    /// Comment tokens for line classification in the generic backend.
    pub fn comment_syntax(&self) -> CommentSyntax {
        match self {
            Self::Python | Self::Ruby | Self::Bash => CommentSyntax {
                line: &["#"],
                block: &[("\"\"\"", "\"\"\""), ("'''", "'''"), ("=begin", "=end")],
            },
            Self::Php => CommentSyntax {
                line: &["//", "#"],
                block: &[("/*", "*/")],
            },
            Self::Lua => CommentSyntax {
                line: &["--"],
                block: &[("--[[", "]]")],
            },
            Self::Html | Self::Vue | Self::Svelte => CommentSyntax {
                line: &["//"],
                block: &[("<!--", "-->"), ("/*", "*/")],
            },
            Self::Css => CommentSyntax {
                line: &[],
                block: &[("/*", "*/")],
            },
            Self::Json | Self::SourceMap => CommentSyntax {
                line: &[],
                block: &[],
            },
            _ => C_STYLE,
        }
    }

    /// Whether blocks are delimited by indentation instead of braces.
    pub fn uses_indentation_blocks(&self) -> bool {
        matches!(self, Self::Python)
    }

    /// Every extension recognized for this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Go => &["go"],
            Self::Rust => &["rs"],
            Self::Python => &["py", "pyi"],
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::JavaScript => &["js", "mjs", "cjs"],
            Self::Tsx => &["tsx"],
            Self::Jsx => &["jsx"],
            Self::Java => &["java"],
            Self::C => &["c", "h"],
            Self::Cpp => &["cpp", "cc", "cxx", "hpp", "hxx", "hh"],
            Self::CSharp => &["cs"],
            Self::Ruby => &["rb", "rake", "gemspec"],
            Self::Php => &["php"],
            Self::Bash => &["sh", "bash"],
            Self::Kotlin => &["kt", "kts"],
            Self::Swift => &["swift"],
            Self::Scala => &["scala", "sc"],
            Self::Lua => &["lua"],
            Self::Dart => &["dart"],
            Self::Vue => &["vue"],
            Self::Svelte => &["svelte"],
            Self::Css => &["css"],
            Self::Scss => &["scss", "sass", "less"],
            Self::Html => &["html", "htm"],
            Self::Json => &["json"],
            Self::SourceMap => &["map"],
        }
    }

    /// All recognized languages.
    pub fn all() -> &'static [Language] {
        &[
            Self::Go,
            Self::Rust,
            Self::Python,
            Self::TypeScript,
            Self::JavaScript,
            Self::Tsx,
            Self::Jsx,
            Self::Java,
            Self::C,
            Self::Cpp,
            Self::CSharp,
            Self::Ruby,
            Self::Php,
            Self::Bash,
            Self::Kotlin,
            Self::Swift,
            Self::Scala,
            Self::Lua,
            Self::Dart,
            Self::Vue,
            Self::Svelte,
            Self::Css,
            Self::Scss,
            Self::Html,
            Self::Json,
            Self::SourceMap,
        ]
    }

    /// Extensions of every source language, the default history allow-list.
    pub fn source_extensions() -> Vec<&'static str> {
        Self::all()
            .iter()
            .filter(|lang| lang.is_source())
            .flat_map(|lang| lang.extensions().iter().copied())
            .collect()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
