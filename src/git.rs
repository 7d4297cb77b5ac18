//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands, handling
//! command execution, timeouts and error formatting. Every call runs git
//! with a C locale so the text matched elsewhere stays stable.

use colored::Colorize;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::Config;

/// Callback invoked with the arguments of each git command before it runs.
pub type GitLogger = fn(&[&str]);

/// Echoes the git command to stderr.
pub fn verbose_logger(args: &[&str]) {
    eprintln!("  {} git {}", "$".dimmed(), args.join(" ").dimmed());
}

pub fn no_op_logger(_args: &[&str]) {}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git was not found on PATH; install git and try again")]
    Unavailable,

    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} failed: {stderr}")]
    Failed {
        args: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("git {args} timed out after {}s", timeout.as_secs())]
    TimedOut { args: String, timeout: Duration },
}

impl GitError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, GitError::TimedOut { .. })
    }

    /// Diagnostic text git printed, falling back to the error message.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            GitError::Failed { stdout, stderr, .. } if stderr.is_empty() => stdout.clone(),
            GitError::Failed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// Captured result of a git invocation that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Returns at most `limit` characters of `text`, trimmed.
#[must_use]
pub fn truncate_diagnostic(text: &str, limit: usize) -> String {
    text.trim().chars().take(limit).collect()
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn execute(
    cwd: Option<&Path>,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<GitOutput, GitError> {
    let joined = args.join(" ");
    tracing::debug!(args = %joined, cwd = ?cwd, "running git");

    let mut command = Command::new("git");
    command
        .args(args)
        .env("LC_ALL", "C")
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| {
        let missing_cwd = cwd.is_some_and(|dir| !dir.is_dir());
        if source.kind() == std::io::ErrorKind::NotFound && !missing_cwd {
            GitError::Unavailable
        } else {
            GitError::Spawn {
                args: joined.clone(),
                source,
            }
        }
    })?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout).map_err(|source| GitError::Spawn {
        args: joined.clone(),
        source,
    })?;

    let Some(status) = status else {
        // Readers are left detached: helpers spawned by git may still hold the pipes.
        let timeout = timeout.unwrap_or_default();
        tracing::warn!(args = %joined, secs = timeout.as_secs(), "git timed out");
        return Err(GitError::TimedOut {
            args: joined,
            timeout,
        });
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(GitOutput {
        success: status.success(),
        code: status.code(),
        stdout: String::from_utf8_lossy(&stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
    })
}

fn into_stdout(args: &[&str], output: GitOutput) -> Result<String, GitError> {
    if output.success {
        Ok(output.stdout)
    } else {
        Err(GitError::Failed {
            args: args.join(" "),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Runs git in `repo` and returns the captured output whatever the exit status.
///
/// Only spawn failures and timeouts are errors.
pub fn run_git_output(repo: &Path, config: &Config, args: &[&str]) -> Result<GitOutput, GitError> {
    execute(Some(repo), args, Some(config.git_timeout))
}

/// Runs git in `repo` and returns trimmed stdout, failing on a non-zero exit.
pub fn run_git(repo: &Path, config: &Config, args: &[&str]) -> Result<String, GitError> {
    let output = run_git_output(repo, config, args)?;
    into_stdout(args, output)
}

fn logged(repo: &Path, config: &Config, args: &[&str], logger: GitLogger) -> Result<String, GitError> {
    logger(args);
    run_git(repo, config, args)
}

/// Confirms a git executable can be launched, returning its version line.
pub fn ensure_available() -> Result<String, GitError> {
    let args = ["--version"];
    let output = execute(None, &args, Some(Duration::from_secs(10)))?;
    into_stdout(&args, output)
}

pub fn is_inside_work_tree(repo: &Path, config: &Config, logger: GitLogger) -> Result<bool, GitError> {
    logged(repo, config, &["rev-parse", "--is-inside-work-tree"], logger)
        .map(|output| output.to_lowercase().contains("true"))
}

pub fn get_current_branch(repo: &Path, config: &Config, logger: GitLogger) -> Result<String, GitError> {
    logged(repo, config, &["rev-parse", "--abbrev-ref", "HEAD"], logger)
}

pub fn get_current_commit(repo: &Path, config: &Config, logger: GitLogger) -> Result<String, GitError> {
    logged(repo, config, &["rev-parse", "HEAD"], logger)
}

pub fn has_uncommitted_changes(
    repo: &Path,
    config: &Config,
    logger: GitLogger,
) -> Result<bool, GitError> {
    logged(repo, config, &["status", "--porcelain"], logger).map(|output| !output.is_empty())
}

/// Paths with unresolved merge conflicts.
pub fn list_unmerged_paths(
    repo: &Path,
    config: &Config,
    logger: GitLogger,
) -> Result<Vec<String>, GitError> {
    logged(repo, config, &["diff", "--name-only", "--diff-filter=U"], logger).map(|output| {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    })
}

pub fn fetch_all(repo: &Path, config: &Config, logger: GitLogger) -> Result<(), GitError> {
    logged(repo, config, &["fetch", "--all"], logger)?;
    Ok(())
}

/// Attempts a fast-forward-only merge of the upstream branch.
///
/// The raw output is returned even when git rejects the merge so the caller
/// can tell the failure modes apart.
pub fn merge_ff_only(repo: &Path, config: &Config, logger: GitLogger) -> Result<GitOutput, GitError> {
    let args = ["merge", "--ff-only"];
    logger(&args);
    run_git_output(repo, config, &args)
}

pub fn reset_hard(
    repo: &Path,
    config: &Config,
    target: &str,
    logger: GitLogger,
) -> Result<(), GitError> {
    logged(repo, config, &["reset", "--hard", target], logger)?;
    Ok(())
}

pub fn remote_url(
    repo: &Path,
    config: &Config,
    remote: &str,
    logger: GitLogger,
) -> Result<String, GitError> {
    logged(repo, config, &["remote", "get-url", remote], logger)
}

/// Raw `git remote -v` listing.
pub fn list_remotes(repo: &Path, config: &Config, logger: GitLogger) -> Result<String, GitError> {
    logged(repo, config, &["remote", "-v"], logger)
}

pub fn status_text(repo: &Path, config: &Config, logger: GitLogger) -> Result<String, GitError> {
    logged(repo, config, &["status"], logger)
}

pub fn diff_range(
    repo: &Path,
    config: &Config,
    range: &str,
    logger: GitLogger,
) -> Result<String, GitError> {
    logged(repo, config, &["diff", range], logger)
}

/// Returns `(behind, ahead)` of HEAD relative to `upstream`.
pub fn ahead_behind(
    repo: &Path,
    config: &Config,
    upstream: &str,
    logger: GitLogger,
) -> Result<(u64, u64), GitError> {
    let range = format!("{}...HEAD", upstream);
    let args = ["rev-list", "--left-right", "--count", range.as_str()];
    let output = logged(repo, config, &args, logger)?;

    let mut counts = output.split_whitespace().map(str::parse::<u64>);
    match (counts.next(), counts.next()) {
        (Some(Ok(behind)), Some(Ok(ahead))) => Ok((behind, ahead)),
        _ => Err(GitError::Failed {
            args: args.join(" "),
            code: None,
            stdout: output,
            stderr: "unexpected rev-list output".to_string(),
        }),
    }
}

/// Shallow-clones `url` into `dest`. Clones are not bounded by the git timeout.
pub fn clone_shallow(
    url: &str,
    dest: &Path,
    depth: u32,
    recurse_submodules: bool,
    logger: GitLogger,
) -> Result<(), GitError> {
    let depth = depth.to_string();
    let dest = dest.to_string_lossy();
    let mut args = vec!["clone", "--depth", depth.as_str()];
    if recurse_submodules {
        args.push("--recurse-submodules");
    }
    args.push(url);
    args.push(dest.as_ref());

    logger(&args);
    let output = execute(None, &args, None)?;
    into_stdout(&args, output).map(|_| ())
}
