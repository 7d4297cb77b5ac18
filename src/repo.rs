// Repository discovery and local state classification

use crate::config::Config;
use crate::constants::{DEFAULT_BRANCH, DEFAULT_REPO_NAME, GIT_DIR};
use crate::error::NodesError;
use crate::git;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Local state of one working tree, captured before any update is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRecord {
    pub path: PathBuf,
    pub branch: String,
    pub dirty: bool,
    pub conflicted: bool,
    pub conflict_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    Clean,
    Dirty,
    Conflicted,
}

impl RepoRecord {
    /// Conflicts take precedence over plain local modifications.
    #[must_use]
    pub fn state(&self) -> RepoState {
        if self.conflicted {
            RepoState::Conflicted
        } else if self.dirty {
            RepoState::Dirty
        } else {
            RepoState::Clean
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        repo_name(&self.path)
    }
}

#[must_use]
pub fn repo_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_REPO_NAME)
}

/// True when `path` carries a `.git` directory marker.
pub fn is_git_repo(path: &Path) -> bool {
    path.join(GIT_DIR).is_dir()
}

/// True when `path` has the marker and git confirms it is a working tree.
pub fn is_valid_work_tree(path: &Path, config: &Config) -> bool {
    is_git_repo(path)
        && git::is_inside_work_tree(path, config, config.git_logger()).unwrap_or(false)
}

fn require_dir(root: &Path) -> Result<(), NodesError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(NodesError::RootNotFound {
            path: root.to_path_buf(),
        })
    }
}

/// Recursively finds every working tree under `root`, including `root` itself.
///
/// A repository nested inside another repository's working tree is reported
/// as a separate record. Descent never enters `.git` directories, so
/// submodules (whose `.git` is a file) are not reported.
pub fn find_git_repos(root: &Path, config: &Config) -> Result<Vec<PathBuf>, NodesError> {
    require_dir(root)?;

    let repos = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != GIT_DIR)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_valid_work_tree(path, config))
        .collect();

    Ok(repos)
}

/// Lists immediate subdirectories of `dir` that carry a `.git` marker, sorted by name.
pub fn find_immediate_repos(dir: &Path) -> Result<Vec<PathBuf>, NodesError> {
    require_dir(dir)?;

    let entries = std::fs::read_dir(dir).map_err(|source| NodesError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut repos: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && is_git_repo(p))
        .collect();
    repos.sort();
    Ok(repos)
}

/// Inspects a repository without modifying it.
///
/// Failed status or conflict queries are treated as dirty or conflicted so
/// that the repository is skipped rather than updated.
pub fn classify(path: &Path, config: &Config) -> RepoRecord {
    let logger = config.git_logger();

    let branch = git::get_current_branch(path, config, logger)
        .ok()
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    let dirty = git::has_uncommitted_changes(path, config, logger).unwrap_or(true);

    let (conflicted, conflict_files) = match git::list_unmerged_paths(path, config, logger) {
        Ok(files) => (!files.is_empty(), files),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "conflict query failed");
            (true, Vec::new())
        }
    };

    RepoRecord {
        path: path.to_path_buf(),
        branch,
        dirty,
        conflicted,
        conflict_files,
    }
}
