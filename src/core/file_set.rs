//! File set for collecting files to analyze.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use super::{FileKey, Language, Result};
use crate::config::Config;

/// Directory names that are never analyzed: VCS internals, dependency and
/// vendor trees, virtual environments, build outputs and bytecode caches.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "bower_components",
    "vendor",
    "third_party",
    "venv",
    ".venv",
    "env",
    "virtualenv",
    ".tox",
    "build",
    "dist",
    "out",
    "target",
    ".next",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
];

/// Whether a single directory name is on the exclusion list.
pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.iter().any(|dir| dir.eq_ignore_ascii_case(name))
}

/// Whether any directory component of a root-relative path is excluded.
pub fn is_excluded_path(relative: &Path) -> bool {
    let mut components: Vec<_> = relative.components().collect();
    // The last component is the file itself.
    components.pop();
    components.into_iter().any(|component| match component {
        Component::Normal(name) => is_excluded_dir(&name.to_string_lossy()),
        _ => false,
    })
}

/// Compile user exclude globs into one matcher.
pub fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            super::Error::config(format!("invalid exclude pattern {pattern:?}: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| super::Error::config(format!("invalid exclude patterns: {e}")))
}

/// Why a file is left out of analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    UnknownLanguage,
    ExcludedDirectory,
    ExcludePattern,
}

impl Exclusion {
    pub fn reason(self) -> &'static str {
        match self {
            Self::UnknownLanguage => "file type is not analyzed",
            Self::ExcludedDirectory => "file is inside an excluded directory",
            Self::ExcludePattern => "file matches an exclude pattern",
        }
    }
}

/// The eligibility rule shared by directory walks and single-file lookups.
#[derive(Debug, Clone)]
pub struct Eligibility {
    exclude_set: GlobSet,
}

impl Eligibility {
    pub fn new(exclude_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            exclude_set: build_exclude_set(exclude_patterns)?,
        })
    }

    /// Check a root-relative file path. `None` means the file is analyzed.
    pub fn check(&self, relative: &Path) -> Option<Exclusion> {
        if Language::detect(relative).is_none() {
            Some(Exclusion::UnknownLanguage)
        } else if is_excluded_path(relative) {
            Some(Exclusion::ExcludedDirectory)
        } else if self.exclude_set.is_match(relative) {
            Some(Exclusion::ExcludePattern)
        } else {
            None
        }
    }
}

/// A set of files to analyze. Only the exclusion rules apply; dot-directories
/// and ignore files do not filter the walk.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Root directory.
    root: PathBuf,
    /// All files in the set, absolute.
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Create a file set from a directory path.
    pub fn from_path(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        Self::from_path_with_patterns(path, &config.exclude_patterns)
    }

    /// Create a file set from a directory path without config.
    pub fn from_path_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_patterns(path, &[])
    }

    /// Create a file set with custom exclude patterns.
    pub fn from_path_with_patterns(
        path: impl AsRef<Path>,
        exclude_patterns: &[String],
    ) -> Result<Self> {
        let root = path.as_ref().canonicalize()?;
        let eligibility = Eligibility::new(exclude_patterns)?;
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && is_excluded_dir(&entry.file_name().to_string_lossy()))
            })
            .build();

        for entry in walker.flatten() {
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let relative = path.strip_prefix(&root).unwrap_or(path);
            if eligibility.check(relative).is_some() {
                continue;
            }

            files.push(path.to_path_buf());
        }

        // Sort for deterministic ordering
        files.sort();

        Ok(Self { root, files })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get all files in the set.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over files.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Normalized key for a file in this set.
    pub fn key_for(&self, path: &Path) -> FileKey {
        FileKey::from_path(&self.root, path)
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_empty() {
        let temp = tempfile::tempdir().unwrap();
        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert!(file_set.is_empty());
        assert_eq!(file_set.len(), 0);
    }

    #[test]
    fn test_file_set_with_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.go"), "package main").unwrap();
        std::fs::write(temp.path().join("lib.rs"), "fn main() {}").unwrap();
        std::fs::write(temp.path().join("README.md"), "# README").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert_eq!(file_set.len(), 2);
    }

    #[test]
    fn test_file_set_skips_excluded_directories() {
        let temp = tempfile::tempdir().unwrap();
        for dir in ["node_modules/pkg", "venv/lib", "__pycache__", "src"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        std::fs::write(temp.path().join("node_modules/pkg/index.js"), "x").unwrap();
        std::fs::write(temp.path().join("venv/lib/site.py"), "x = 1").unwrap();
        std::fs::write(temp.path().join("__pycache__/mod.py"), "x = 1").unwrap();
        std::fs::write(temp.path().join("src/app.py"), "x = 1").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        assert_eq!(file_set.len(), 1);
        let key = file_set.key_for(&file_set.files()[0]);
        assert_eq!(key.as_str(), "src/app.py");
    }

    #[test]
    fn test_file_set_applies_exclude_globs() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("generated")).unwrap();
        std::fs::write(temp.path().join("generated/api.ts"), "export {}").unwrap();
        std::fs::write(temp.path().join("main.ts"), "export {}").unwrap();

        let file_set =
            FileSet::from_path_with_patterns(temp.path(), &["generated/**".to_string()])
                .unwrap();
        assert_eq!(file_set.len(), 1);
    }

    #[test]
    fn test_file_set_walks_dot_directories_and_ignored_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(".ci")).unwrap();
        std::fs::create_dir_all(temp.path().join(".git")).unwrap();
        std::fs::write(temp.path().join(".ci/deploy.py"), "x = 1").unwrap();
        std::fs::write(temp.path().join(".git/hook.py"), "x = 1").unwrap();
        std::fs::write(temp.path().join(".gitignore"), "scratch.py\n").unwrap();
        std::fs::write(temp.path().join("scratch.py"), "x = 1").unwrap();

        let file_set = FileSet::from_path_default(temp.path()).unwrap();
        let keys: Vec<String> = file_set
            .iter()
            .map(|path| file_set.key_for(path).to_string())
            .collect();
        assert_eq!(keys, vec![".ci/deploy.py", "scratch.py"]);
    }

    #[test]
    fn test_eligibility_check_order() {
        let eligibility = Eligibility::new(&["gen/**".to_string()]).unwrap();
        assert_eq!(eligibility.check(Path::new("src/app.py")), None);
        assert_eq!(eligibility.check(Path::new(".ci/deploy.py")), None);
        assert_eq!(
            eligibility.check(Path::new("docs/README.md")),
            Some(Exclusion::UnknownLanguage)
        );
        assert_eq!(
            eligibility.check(Path::new("vendor/lib.go")),
            Some(Exclusion::ExcludedDirectory)
        );
        assert_eq!(
            eligibility.check(Path::new("gen/api.ts")),
            Some(Exclusion::ExcludePattern)
        );
    }

    #[test]
    fn test_is_excluded_path() {
        assert!(is_excluded_path(Path::new("node_modules/a/b.js")));
        assert!(is_excluded_path(Path::new("pkg/Build/out.js")));
        assert!(!is_excluded_path(Path::new("src/build.rs")));
        assert!(!is_excluded_path(Path::new("main.py")));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let err = build_exclude_set(&["[".to_string()]).unwrap_err();
        assert!(err.is_configuration());
    }
}
