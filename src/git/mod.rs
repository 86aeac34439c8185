//! Git operations for repository analysis.

mod log;

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::core::{Error, Result};

pub use log::{ChangeType, Commit, FileChange};

/// Git repository wrapper for analysis operations.
pub struct GitRepo {
    /// The libgit2 repository handle.
    repo: Repository,
    /// Repository work tree root.
    root: PathBuf,
}

impl GitRepo {
    /// Open a git repository rooted exactly at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())
            .map_err(|e| Error::git(format!("Failed to open repository: {}", e.message())))?;
        Self::from_repository(repo)
    }

    /// Find the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path.as_ref())
            .map_err(|e| Error::git(format!("Failed to discover repository: {}", e.message())))?;
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| Error::git("Not a work tree"))?;
        // Canonical so that analysis roots can be compared against it.
        let root = workdir.canonicalize()?;
        Ok(Self { repo, root })
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the HEAD commit SHA, or `None` for a repository without commits.
    pub fn head_sha(&self) -> Result<Option<String>> {
        if self.repo.is_empty()? {
            return Ok(None);
        }
        let head = self.repo.head()?;
        Ok(head.target().map(|oid| oid.to_string()))
    }

    /// Get the non-merge commit log, newest first.
    ///
    /// `filter` receives work-tree-relative paths and selects which files get
    /// line statistics.
    pub fn log<F>(&self, max_commits: Option<usize>, filter: F) -> Result<Vec<Commit>>
    where
        F: Fn(&Path) -> bool,
    {
        log::get_log(&self.repo, max_commits, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn commit_file(repo: &Repository, name: &str, content: &str, author: &str) {
        let workdir = repo.workdir().unwrap();
        let full = workdir.join(name);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now(author, &format!("{author}@example.com")).unwrap();
        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parent_refs)
            .unwrap();
    }

    #[test]
    fn test_git_repo_open_not_a_repo() {
        let temp = tempfile::tempdir().unwrap();
        let result = GitRepo::open(temp.path());
        assert!(matches!(result, Err(Error::Git(_))));
    }

    #[test]
    fn test_empty_repository_has_no_log() {
        let temp = tempfile::tempdir().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::open(temp.path()).unwrap();
        assert!(repo.head_sha().unwrap().is_none());
        assert!(repo.log(None, |_| true).unwrap().is_empty());
    }

    #[test]
    fn test_log_records_line_stats() {
        let temp = tempfile::tempdir().unwrap();
        let raw = Repository::init(temp.path()).unwrap();
        commit_file(&raw, "src/app.py", "a = 1\nb = 2\n", "alice");
        commit_file(&raw, "src/app.py", "a = 1\nb = 3\nc = 4\n", "bob");
        commit_file(&raw, "README.md", "# readme\n", "alice");

        let repo = GitRepo::open(temp.path()).unwrap();
        let commits = repo
            .log(None, |p| p.extension().is_some_and(|e| e == "py"))
            .unwrap();
        assert_eq!(commits.len(), 3);

        // Newest first; the README commit has no matching files.
        assert!(commits[0].files.is_empty());
        let second = &commits[1].files[0];
        assert_eq!(second.path, PathBuf::from("src/app.py"));
        assert_eq!(second.additions, 2);
        assert_eq!(second.deletions, 1);
        assert_eq!(second.change_type, ChangeType::Modified);
        let first = &commits[2].files[0];
        assert_eq!(first.additions, 2);
        assert_eq!(first.change_type, ChangeType::Added);
        assert_eq!(commits[2].author, "alice");
    }

    #[test]
    fn test_log_respects_commit_cap() {
        let temp = tempfile::tempdir().unwrap();
        let raw = Repository::init(temp.path()).unwrap();
        for i in 0..4 {
            commit_file(&raw, "main.go", &format!("package main // {i}\n"), "alice");
        }
        let repo = GitRepo::open(temp.path()).unwrap();
        assert_eq!(repo.log(Some(2), |_| true).unwrap().len(), 2);
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = tempfile::tempdir().unwrap();
        let raw = Repository::init(temp.path()).unwrap();
        commit_file(&raw, "pkg/lib.rs", "fn f() {}\n", "alice");
        let repo = GitRepo::discover(temp.path().join("pkg")).unwrap();
        assert_eq!(repo.root(), temp.path().canonicalize().unwrap());
        assert!(repo.head_sha().unwrap().is_some());
    }
}
