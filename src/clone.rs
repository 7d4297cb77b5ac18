//! Shallow cloning of the repositories listed in an HTML document.
//!
//! Each clone owns its destination directory, so clones run independently on
//! a fixed-size rayon pool when more than one job is requested.

use crate::config::Config;
use crate::git::{self, GitLogger};
use crate::links::RepoLink;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    pub target: PathBuf,
    pub depth: u32,
    pub force: bool,
    pub recurse_submodules: bool,
    pub dry_run: bool,
    pub jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    Cloned,
    /// Destination already present and force was not requested.
    Skipped { dest: PathBuf },
    /// Dry run: the actions that would have been taken.
    Planned { actions: Vec<String> },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct CloneResult {
    pub link: RepoLink,
    pub dest: PathBuf,
    pub outcome: CloneOutcome,
    pub duration: Duration,
}

/// `cloned + skipped + planned + failed == total`, independent of completion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneTally {
    pub total: usize,
    pub cloned: usize,
    pub skipped: usize,
    pub planned: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct CloneReport {
    /// Results in input order.
    pub results: Vec<CloneResult>,
    pub duration: Duration,
}

impl CloneReport {
    #[must_use]
    pub fn tally(&self) -> CloneTally {
        self.results
            .iter()
            .fold(CloneTally::default(), |mut tally, result| {
                tally.total += 1;
                match result.outcome {
                    CloneOutcome::Cloned => tally.cloned += 1,
                    CloneOutcome::Skipped { .. } => tally.skipped += 1,
                    CloneOutcome::Planned { .. } => tally.planned += 1,
                    CloneOutcome::Failed { .. } => tally.failed += 1,
                }
                tally
            })
    }

    pub fn failures(&self) -> impl Iterator<Item = &CloneResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CloneOutcome::Failed { .. }))
    }
}

fn clone_command(link: &RepoLink, dest: &Path, options: &CloneOptions) -> String {
    let mut parts = vec![
        "git".to_string(),
        "clone".to_string(),
        "--depth".to_string(),
        options.depth.to_string(),
    ];
    if options.recurse_submodules {
        parts.push("--recurse-submodules".to_string());
    }
    parts.push(link.url.clone());
    parts.push(dest.display().to_string());
    parts.join(" ")
}

fn remove_existing(dest: &Path) -> std::io::Result<()> {
    if dest.is_dir() {
        std::fs::remove_dir_all(dest)
    } else {
        std::fs::remove_file(dest)
    }
}

fn plan_or_clone(link: &RepoLink, dest: &Path, options: &CloneOptions, logger: GitLogger) -> CloneOutcome {
    let exists = dest.symlink_metadata().is_ok();

    if exists && !options.force {
        return CloneOutcome::Skipped {
            dest: dest.to_path_buf(),
        };
    }

    if options.dry_run {
        let mut actions = Vec::new();
        if exists {
            actions.push(format!("Would remove existing: {}", dest.display()));
        }
        actions.push(clone_command(link, dest, options));
        return CloneOutcome::Planned { actions };
    }

    if exists {
        if let Err(err) = remove_existing(dest) {
            return CloneOutcome::Failed {
                error: format!("could not remove {}: {}", dest.display(), err),
            };
        }
    }

    // Only a directory this clone created may be cleaned up after a failure.
    let vacant = dest.symlink_metadata().is_err();
    match git::clone_shallow(
        &link.url,
        dest,
        options.depth,
        options.recurse_submodules,
        logger,
    ) {
        Ok(()) => CloneOutcome::Cloned,
        Err(err) => {
            if vacant && dest.exists() {
                let _ = std::fs::remove_dir_all(dest);
            }
            CloneOutcome::Failed {
                error: format!(
                    "Clone failed for {} -> {}\n{}",
                    link.url,
                    dest.display(),
                    err.diagnostic()
                ),
            }
        }
    }
}

/// Clones a single link into `options.target`.
pub fn clone_one(link: &RepoLink, options: &CloneOptions, config: &Config) -> CloneResult {
    let started = Instant::now();
    let dest = options.target.join(&link.name);
    let outcome = plan_or_clone(link, &dest, options, config.git_logger());

    if let CloneOutcome::Failed { error } = &outcome {
        tracing::warn!(name = %link.name, url = %link.url, %error, "clone failed");
    }

    CloneResult {
        link: link.clone(),
        dest,
        outcome,
        duration: started.elapsed(),
    }
}

/// Marks each link whose destination repeats that of an earlier link.
///
/// Only the first link for a destination is cloned, whatever the job count.
#[must_use]
pub fn repeated_destinations(links: &[RepoLink], target: &Path) -> Vec<bool> {
    let mut seen = HashSet::new();
    links
        .iter()
        .map(|link| !seen.insert(target.join(&link.name)))
        .collect()
}

fn skip_repeated(link: &RepoLink, options: &CloneOptions) -> CloneResult {
    let dest = options.target.join(&link.name);
    tracing::debug!(name = %link.name, url = %link.url, "destination already claimed by an earlier link");
    CloneResult {
        link: link.clone(),
        outcome: CloneOutcome::Skipped { dest: dest.clone() },
        dest,
        duration: Duration::ZERO,
    }
}

/// Clones every link, calling `on_complete` as each finishes.
///
/// With `jobs > 1` clones run on a dedicated pool of that size and
/// `on_complete` fires in completion order; the returned results always keep
/// input order. A failure never stops the remaining clones. Links sharing a
/// destination are resolved in input order before any clone starts, so the
/// tally does not depend on the job count.
pub fn clone_all<F>(
    links: &[RepoLink],
    options: &CloneOptions,
    config: &Config,
    on_complete: F,
) -> CloneReport
where
    F: Fn(&CloneResult) + Sync,
{
    let started = Instant::now();
    let repeated = repeated_destinations(links, &options.target);
    let run = |(link, repeated): (&RepoLink, &bool)| {
        let result = if *repeated {
            skip_repeated(link, options)
        } else {
            clone_one(link, options, config)
        };
        on_complete(&result);
        result
    };

    let sequential = || links.iter().zip(&repeated).map(run).collect::<Vec<_>>();

    let results = if options.jobs <= 1 {
        sequential()
    } else {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| links.par_iter().zip(&repeated).map(run).collect()),
            Err(err) => {
                tracing::warn!(error = %err, "could not start clone pool, cloning sequentially");
                sequential()
            }
        }
    };

    CloneReport {
        results,
        duration: started.elapsed(),
    }
}
