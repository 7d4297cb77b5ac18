//! Test infrastructure for nodekeeper integration tests.

#![allow(dead_code)]

use anyhow::Result;
use nodekeeper::config::Config;
use nodekeeper::git::{self, GitOutput};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Quiet config so test output stays readable.
pub fn test_config() -> Config {
    Config::from_flags(true, false, None)
}

pub fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    Ok(git::run_git(dir, &test_config(), args)?)
}

/// Runs git without failing on a non-zero exit.
pub fn run_git_output(dir: &Path, args: &[&str]) -> Result<GitOutput> {
    Ok(git::run_git_output(dir, &test_config(), args)?)
}

fn configure_identity(path: &Path) -> Result<()> {
    run_git(path, &["config", "user.email", "test@example.com"])?;
    run_git(path, &["config", "user.name", "Test User"])?;
    run_git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// A bare "remote" on `main` plus an author checkout used to publish commits.
/// Automatically cleaned up when dropped.
pub struct Upstream {
    _temp_dir: TempDir,
    bare: PathBuf,
    author: PathBuf,
}

impl Upstream {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let bare = temp_dir.path().join("remote.git");
        let author = temp_dir.path().join("author");
        std::fs::create_dir_all(&bare)?;
        std::fs::create_dir_all(&author)?;

        run_git(&bare, &["init", "--bare", "-b", "main"])?;
        run_git(&author, &["init", "-b", "main"])?;
        configure_identity(&author)?;

        std::fs::write(author.join("README.md"), "# Node\n")?;
        run_git(&author, &["add", "README.md"])?;
        run_git(&author, &["commit", "-m", "Initial commit"])?;
        run_git(&author, &["remote", "add", "origin", &bare.to_string_lossy()])?;
        run_git(&author, &["push", "-u", "origin", "main"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            bare,
            author,
        })
    }

    pub fn bare(&self) -> &Path {
        &self.bare
    }

    /// `file://` URL so shallow clones honor `--depth`.
    pub fn url(&self) -> String {
        format!("file://{}", self.bare.display())
    }

    /// Commits `content` to `file` and pushes it to the remote.
    pub fn publish(&self, file: &str, content: &str) -> Result<()> {
        std::fs::write(self.author.join(file), content)?;
        run_git(&self.author, &["add", file])?;
        run_git(&self.author, &["commit", "-m", &format!("Update {}", file)])?;
        run_git(&self.author, &["push", "origin", "main"])?;
        Ok(())
    }

    /// Clones the remote into `parent/name` with tracking set up.
    pub fn clone_into(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let dest = parent.join(name);
        run_git(parent, &["clone", &self.bare.to_string_lossy(), name])?;
        configure_identity(&dest)?;
        Ok(dest)
    }
}

pub fn make_dirty(repo: &Path) -> Result<()> {
    std::fs::write(repo.join("README.md"), "# Local edit\n")?;
    Ok(())
}

pub fn commit_local(repo: &Path, file: &str, content: &str) -> Result<()> {
    std::fs::write(repo.join(file), content)?;
    run_git(repo, &["add", file])?;
    run_git(repo, &["commit", "-m", &format!("Local {}", file)])?;
    Ok(())
}

/// Leaves `repo` mid-merge with README.md unmerged.
pub fn make_conflicted(upstream: &Upstream, repo: &Path) -> Result<()> {
    upstream.publish("README.md", "# Upstream\n")?;
    commit_local(repo, "README.md", "# Local\n")?;
    run_git(repo, &["fetch", "origin"])?;
    let merge = run_git_output(repo, &["merge", "--no-edit", "origin/main"])?;
    anyhow::ensure!(!merge.success, "merge unexpectedly succeeded");
    Ok(())
}

pub fn head(repo: &Path) -> Result<String> {
    Ok(git::get_current_commit(repo, &test_config(), git::no_op_logger)?)
}

/// Fresh standalone repository with one commit and no remote.
pub fn init_repo(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    run_git(path, &["init", "-b", "main"])?;
    configure_identity(path)?;
    std::fs::write(path.join("README.md"), "# Test Repo\n")?;
    run_git(path, &["add", "README.md"])?;
    run_git(path, &["commit", "-m", "Initial commit"])?;
    Ok(())
}
