//! Git log operations.

use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, Patch, Repository, Sort};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// A git commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Commit SHA.
    pub sha: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Commit timestamp (seconds since the Unix epoch, UTC).
    pub timestamp: i64,
    /// Files changed in this commit.
    pub files: Vec<FileChange>,
}

/// A file change in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository work tree, after the change.
    pub path: PathBuf,
    /// Lines added.
    pub additions: u32,
    /// Lines deleted.
    pub deletions: u32,
    /// Change type (added, modified, deleted, renamed).
    pub change_type: ChangeType,
}

/// Type of file change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeType {
    fn from_delta(status: Delta) -> Self {
        match status {
            Delta::Added | Delta::Copied | Delta::Untracked => Self::Added,
            Delta::Deleted => Self::Deleted,
            Delta::Renamed => Self::Renamed,
            _ => Self::Modified,
        }
    }
}

/// Walk history from HEAD, newest first, skipping merge commits.
///
/// Only files accepted by `filter` get line statistics computed and recorded.
/// An empty repository yields no commits.
pub fn get_log<F>(repo: &Repository, max_commits: Option<usize>, filter: F) -> Result<Vec<Commit>>
where
    F: Fn(&Path) -> bool,
{
    if repo.is_empty()? {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        if max_commits.is_some_and(|max| commits.len() >= max) {
            break;
        }

        let commit = repo.find_commit(oid?)?;
        if commit.parent_count() > 1 {
            continue;
        }

        let files = commit_file_changes(repo, &commit, &filter)?;
        let author = commit.author();
        commits.push(Commit {
            sha: commit.id().to_string(),
            author: author.name().unwrap_or_default().to_string(),
            email: author.email().unwrap_or_default().to_string(),
            timestamp: commit.time().seconds(),
            files,
        });
    }

    Ok(commits)
}

/// Diff a commit against its first parent (or the empty tree for a root commit).
fn commit_file_changes<F>(
    repo: &Repository,
    commit: &git2::Commit<'_>,
    filter: &F,
) -> Result<Vec<FileChange>>
where
    F: Fn(&Path) -> bool,
{
    let tree = commit.tree()?;
    let parent_tree = match commit.parent_count() {
        0 => None,
        _ => Some(commit.parent(0)?.tree()?),
    };

    let mut opts = DiffOptions::new();
    opts.ignore_submodules(true);
    let mut diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;
    // Rename detection does not depend on the `diff.renames` setting.
    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))?;

    let mut changes = Vec::new();
    for idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };
        let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };
        if !filter(path) {
            continue;
        }
        let path = path.to_path_buf();
        let change_type = ChangeType::from_delta(delta.status());

        // Binary files have no patch.
        let (additions, deletions) = match Patch::from_diff(&diff, idx)? {
            Some(patch) => {
                let (_, additions, deletions) = patch.line_stats()?;
                (additions as u32, deletions as u32)
            }
            None => (0, 0),
        };

        changes.push(FileChange {
            path,
            additions,
            deletions,
            change_type,
        });
    }

    Ok(changes)
}
