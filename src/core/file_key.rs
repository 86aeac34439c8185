//! Normalized file identity used to join history and static results.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Project-relative file identity.
///
/// Lowercase, forward-slash separated, no leading `./` or `/`, no trailing
/// slash. Two paths that differ only in case or separator style map to the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    /// Normalize a raw path string into a key.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Build a key for `path` relative to `root`.
    ///
    /// Paths outside `root` are normalized as given.
    pub fn from_path(root: &Path, path: &Path) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path);
        Self::new(relative.to_string_lossy())
    }

    /// The normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (the project root itself).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-root a key under `prefix`, returning `None` when it lies outside.
    ///
    /// Used when the analysis root is a subdirectory of the repository.
    pub fn strip_prefix(&self, prefix: &FileKey) -> Option<FileKey> {
        if prefix.is_empty() {
            return Some(self.clone());
        }
        let rest = self.0.strip_prefix(prefix.as_str())?;
        let rest = rest.strip_prefix('/')?;
        Some(Self(rest.to_string()))
    }
}

/// Normalize a path string: separators, case, redundant segments.
pub fn normalize(raw: &str) -> String {
    raw.replace('\\', "/")
        .to_lowercase()
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_case_and_slash_insensitive() {
        assert_eq!(FileKey::new("Src\\Foo.PY"), FileKey::new("src/foo.py"));
        assert_eq!(FileKey::new("src/foo.py").as_str(), "src/foo.py");
    }

    #[test]
    fn test_strips_leading_and_trailing_separators() {
        assert_eq!(FileKey::new("./src/lib/").as_str(), "src/lib");
        assert_eq!(FileKey::new("/src//lib.rs").as_str(), "src/lib.rs");
        assert_eq!(FileKey::new(".\\A\\.\\B.rs").as_str(), "a/b.rs");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("./Project\\Src//Main.GO/");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_from_path_relative_to_root() {
        let root = PathBuf::from("/work/repo");
        let key = FileKey::from_path(&root, &root.join("App").join("Main.py"));
        assert_eq!(key.as_str(), "app/main.py");
    }

    #[test]
    fn test_strip_prefix() {
        let key = FileKey::new("services/api/handler.go");
        let prefix = FileKey::new("services/api");
        assert_eq!(
            key.strip_prefix(&prefix),
            Some(FileKey::new("handler.go"))
        );
        assert_eq!(key.strip_prefix(&FileKey::new("services/ap")), None);
        assert_eq!(key.strip_prefix(&FileKey::new("")), Some(key.clone()));
    }
}
