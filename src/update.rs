//! Update policy and execution for discovered repositories.
//!
//! Each repository is classified, mapped to an [`Action`] by
//! [`select_action`], and the action is carried out with plain git calls.
//! Nothing here retries; every repository is visited once per run.

use crate::config::Config;
use crate::constants::{DIAGNOSTIC_LIMIT, ORIGIN};
use crate::git::{self, GitError, GitOutput};
use crate::repo::{self, RepoRecord};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const MSG_CONFLICTS: &str = "Repository has merge conflicts.";
pub const MSG_UNCOMMITTED: &str = "Uncommitted changes detected.";
pub const MSG_UP_TO_DATE: &str = "Already up to date.";
pub const MSG_FAST_FORWARDED: &str = "Successfully fast-forwarded.";
pub const MSG_DIVERGED: &str = "Non-fast-forward update required.";
pub const MSG_FORCE_RESET: &str = "Force reset completed. Local repo overwritten with remote.";

/// Why a repository was left alone for an operator to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewReason {
    Conflicts,
    UncommittedChanges,
}

impl ReviewReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ReviewReason::Conflicts => MSG_CONFLICTS,
            ReviewReason::UncommittedChanges => MSG_UNCOMMITTED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FastForward,
    ForceReset,
    Review(ReviewReason),
}

/// Maps local state and the force flag to the action to take.
///
/// Force overrides everything; otherwise only a clean tree is touched.
#[must_use]
pub fn select_action(dirty: bool, conflicted: bool, force: bool) -> Action {
    match (force, conflicted, dirty) {
        (true, _, _) => Action::ForceReset,
        (false, true, _) => Action::Review(ReviewReason::Conflicts),
        (false, false, true) => Action::Review(ReviewReason::UncommittedChanges),
        (false, false, false) => Action::FastForward,
    }
}

/// Result of `git merge --ff-only` as read from its output text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    UpToDate,
    FastForwarded,
    Diverged,
    Failed,
}

/// Interprets merge output. All recognized git phrases live here.
///
/// Git runs under the C locale, so these are the English messages:
/// `Already up to date.` (older releases spell it `up-to-date`) on success and
/// `Not possible to fast-forward` or `Diverging branches can't be
/// fast-forwarded` when history has diverged.
#[must_use]
pub fn classify_merge(output: &GitOutput) -> MergeOutcome {
    let stdout = output.stdout.to_lowercase();
    let stderr = output.stderr.to_lowercase();

    if output.success {
        if stdout.contains("up to date") || stdout.contains("up-to-date") {
            MergeOutcome::UpToDate
        } else {
            MergeOutcome::FastForwarded
        }
    } else if [stderr.as_str(), stdout.as_str()].iter().any(|text| {
        text.contains("not possible to fast-forward")
            || text.contains("diverging branches can't be fast-forwarded")
    }) {
        MergeOutcome::Diverged
    } else {
        MergeOutcome::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStep {
    Classifying,
    Fetching,
    Merging,
    Resetting { target: String },
}

impl std::fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStep::Classifying => write!(f, "Checking local state"),
            UpdateStep::Fetching => write!(f, "Fetching all remotes"),
            UpdateStep::Merging => write!(f, "Fast-forwarding"),
            UpdateStep::Resetting { target } => write!(f, "Resetting to {}", target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Skipped by policy; nothing was attempted.
    NeedsReview,
    /// A git command exited with an error.
    Command,
    /// A git command exceeded the configured timeout.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSuccess {
    pub message: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    pub message: String,
    pub kind: FailureKind,
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Success(UpdateSuccess),
    Failed(UpdateFailure),
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            UpdateOutcome::Success(s) => &s.message,
            UpdateOutcome::Failed(f) => &f.message,
        }
    }
}

#[derive(Debug)]
pub struct UpdateResult {
    pub record: RepoRecord,
    pub outcome: UpdateOutcome,
    pub duration: Duration,
}

impl UpdateResult {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.record.path
    }
}

/// Progress notifications emitted while a run is in flight.
pub trait UpdateCallbacks {
    fn on_update_start(&self, _repo_name: &str) {}
    fn on_classified(&self, _record: &RepoRecord) {}
    fn on_step(&self, step: &UpdateStep);
    fn on_complete(&self, result: &UpdateResult);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub force_overwrite: bool,
}

/// Counts of a finished run. `succeeded + skipped + failed == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<UpdateResult>,
    pub duration: Duration,
}

impl RunReport {
    /// Repositories that were left alone are counted as failures needing review;
    /// the reconciler has no skip outcome.
    #[must_use]
    pub fn tally(&self) -> Tally {
        let succeeded = self
            .results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count();
        Tally {
            total: self.results.len(),
            succeeded,
            skipped: 0,
            failed: self.results.len() - succeeded,
        }
    }

    pub fn needing_review(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.needing_review().next().is_some()
    }
}

fn command_failure(action: &str, err: &GitError, conflicts: &[String]) -> UpdateFailure {
    let (message, kind) = if err.is_timeout() {
        (format!("{} timed out.", action), FailureKind::Timeout)
    } else {
        (
            format!(
                "{} failed: {}",
                action,
                git::truncate_diagnostic(&err.diagnostic(), DIAGNOSTIC_LIMIT)
            ),
            FailureKind::Command,
        )
    };
    UpdateFailure {
        message,
        kind,
        conflicts: conflicts.to_vec(),
    }
}

fn success(message: &str, action: Action) -> UpdateOutcome {
    UpdateOutcome::Success(UpdateSuccess {
        message: message.to_string(),
        action,
    })
}

/// Fetches and fast-forwards a clean repository. Diverged history is reported, never merged.
pub fn fast_forward<C: UpdateCallbacks + ?Sized>(
    path: &Path,
    callbacks: &C,
    config: &Config,
) -> UpdateOutcome {
    let logger = config.git_logger();

    callbacks.on_step(&UpdateStep::Fetching);
    if let Err(err) = git::fetch_all(path, config, logger) {
        return UpdateOutcome::Failed(command_failure("Fetch", &err, &[]));
    }

    callbacks.on_step(&UpdateStep::Merging);
    let output = match git::merge_ff_only(path, config, logger) {
        Ok(output) => output,
        Err(err) => return UpdateOutcome::Failed(command_failure("Merge", &err, &[])),
    };

    match classify_merge(&output) {
        MergeOutcome::UpToDate => success(MSG_UP_TO_DATE, Action::FastForward),
        MergeOutcome::FastForwarded => success(MSG_FAST_FORWARDED, Action::FastForward),
        MergeOutcome::Diverged => UpdateOutcome::Failed(UpdateFailure {
            message: MSG_DIVERGED.to_string(),
            kind: FailureKind::Command,
            conflicts: Vec::new(),
        }),
        MergeOutcome::Failed => {
            let diagnostic = if output.stderr.is_empty() {
                &output.stdout
            } else {
                &output.stderr
            };
            UpdateOutcome::Failed(UpdateFailure {
                message: format!(
                    "Merge failed: {}",
                    git::truncate_diagnostic(diagnostic, DIAGNOSTIC_LIMIT)
                ),
                kind: FailureKind::Command,
                conflicts: Vec::new(),
            })
        }
    }
}

/// Discards all local state and points `branch` at `origin/<branch>`.
pub fn force_reset<C: UpdateCallbacks + ?Sized>(
    path: &Path,
    branch: &str,
    callbacks: &C,
    config: &Config,
) -> UpdateOutcome {
    let logger = config.git_logger();

    callbacks.on_step(&UpdateStep::Fetching);
    if let Err(err) = git::fetch_all(path, config, logger) {
        return UpdateOutcome::Failed(command_failure("Fetch", &err, &[]));
    }

    let target = format!("{}/{}", ORIGIN, branch);
    callbacks.on_step(&UpdateStep::Resetting {
        target: target.clone(),
    });
    match git::reset_hard(path, config, &target, logger) {
        Ok(()) => success(MSG_FORCE_RESET, Action::ForceReset),
        Err(err) => UpdateOutcome::Failed(command_failure("Reset", &err, &[])),
    }
}

/// Classifies one repository and applies the selected action.
pub fn reconcile<C: UpdateCallbacks + ?Sized>(
    path: &Path,
    options: PullOptions,
    callbacks: &C,
    config: &Config,
) -> UpdateResult {
    let started = Instant::now();
    callbacks.on_update_start(repo::repo_name(path));

    callbacks.on_step(&UpdateStep::Classifying);
    let record = repo::classify(path, config);
    callbacks.on_classified(&record);

    let action = select_action(record.dirty, record.conflicted, options.force_overwrite);
    tracing::debug!(path = %path.display(), ?action, "selected action");

    let outcome = match action {
        Action::Review(reason) => UpdateOutcome::Failed(UpdateFailure {
            message: reason.message().to_string(),
            kind: FailureKind::NeedsReview,
            conflicts: record.conflict_files.clone(),
        }),
        Action::FastForward => fast_forward(path, callbacks, config),
        Action::ForceReset => force_reset(path, &record.branch, callbacks, config),
    };

    let outcome = match outcome {
        UpdateOutcome::Failed(mut failure) => {
            if failure.conflicts.is_empty() {
                failure.conflicts = record.conflict_files.clone();
            }
            tracing::warn!(path = %path.display(), reason = %failure.message, "needs manual review");
            UpdateOutcome::Failed(failure)
        }
        ok => ok,
    };

    let result = UpdateResult {
        record,
        outcome,
        duration: started.elapsed(),
    };
    callbacks.on_complete(&result);
    result
}

/// Reconciles every repository in order, one at a time.
pub fn reconcile_all<C: UpdateCallbacks + ?Sized>(
    repos: &[PathBuf],
    options: PullOptions,
    callbacks: &C,
    config: &Config,
) -> RunReport {
    let started = Instant::now();
    let results = repos
        .iter()
        .map(|path| reconcile(path, options, callbacks, config))
        .collect();

    RunReport {
        results,
        duration: started.elapsed(),
    }
}

/// Local-versus-remote picture printed for repositories needing attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub upstream: String,
    pub status: Option<String>,
    pub diff: Option<String>,
    /// `(behind, ahead)` relative to the upstream.
    pub ahead_behind: Option<(u64, u64)>,
}

/// Collects status, diff and ahead/behind counts against `origin/<branch>`. Read-only.
pub fn collect_divergence(record: &RepoRecord, config: &Config) -> Divergence {
    let logger = config.git_logger();
    let upstream = format!("{}/{}", ORIGIN, record.branch);
    let path = record.path.as_path();

    Divergence {
        status: git::status_text(path, config, logger).ok(),
        diff: git::diff_range(path, config, &format!("{}..HEAD", upstream), logger).ok(),
        ahead_behind: git::ahead_behind(path, config, &upstream, logger).ok(),
        upstream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str, stderr: &str) -> GitOutput {
        GitOutput {
            success,
            code: Some(if success { 0 } else { 128 }),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_select_action_table() {
        assert_eq!(select_action(false, false, false), Action::FastForward);
        assert_eq!(
            select_action(true, false, false),
            Action::Review(ReviewReason::UncommittedChanges)
        );
        assert_eq!(
            select_action(false, true, false),
            Action::Review(ReviewReason::Conflicts)
        );
        assert_eq!(
            select_action(true, true, false),
            Action::Review(ReviewReason::Conflicts)
        );
        for dirty in [false, true] {
            for conflicted in [false, true] {
                assert_eq!(select_action(dirty, conflicted, true), Action::ForceReset);
            }
        }
    }

    #[test]
    fn test_classify_merge_up_to_date() {
        assert_eq!(
            classify_merge(&output(true, "Already up to date.", "")),
            MergeOutcome::UpToDate
        );
        assert_eq!(
            classify_merge(&output(true, "Already up-to-date.", "")),
            MergeOutcome::UpToDate
        );
    }

    #[test]
    fn test_classify_merge_fast_forward() {
        let stdout = "Updating 1a2b3c4..5d6e7f8\nFast-forward\n README.md | 2 +-";
        assert_eq!(
            classify_merge(&output(true, stdout, "")),
            MergeOutcome::FastForwarded
        );
    }

    #[test]
    fn test_classify_merge_diverged() {
        assert_eq!(
            classify_merge(&output(false, "", "fatal: Not possible to fast-forward, aborting.")),
            MergeOutcome::Diverged
        );
        assert_eq!(
            classify_merge(&output(
                false,
                "",
                "hint: Diverging branches can't be fast-forwarded, you need to either:"
            )),
            MergeOutcome::Diverged
        );
    }

    #[test]
    fn test_classify_merge_other_failure() {
        assert_eq!(
            classify_merge(&output(
                false,
                "",
                "fatal: No remote for the current branch."
            )),
            MergeOutcome::Failed
        );
    }

    #[test]
    fn test_command_failure_truncates_and_flags_timeouts() {
        let err = GitError::Failed {
            args: "fetch --all".to_string(),
            code: Some(1),
            stdout: String::new(),
            stderr: "x".repeat(500),
        };
        let failure = command_failure("Fetch", &err, &[]);
        assert_eq!(failure.kind, FailureKind::Command);
        assert_eq!(failure.message.len(), "Fetch failed: ".len() + DIAGNOSTIC_LIMIT);

        let err = GitError::TimedOut {
            args: "merge --ff-only".to_string(),
            timeout: Duration::from_secs(1),
        };
        let failure = command_failure("Merge", &err, &[]);
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.message, "Merge timed out.");
    }

    #[test]
    fn test_tally_always_sums_to_total() {
        let record = RepoRecord {
            path: PathBuf::from("/nodes/a"),
            branch: "main".to_string(),
            dirty: false,
            conflicted: false,
            conflict_files: Vec::new(),
        };
        let report = RunReport {
            results: vec![
                UpdateResult {
                    record: record.clone(),
                    outcome: success(MSG_UP_TO_DATE, Action::FastForward),
                    duration: Duration::ZERO,
                },
                UpdateResult {
                    record,
                    outcome: UpdateOutcome::Failed(UpdateFailure {
                        message: MSG_UNCOMMITTED.to_string(),
                        kind: FailureKind::NeedsReview,
                        conflicts: Vec::new(),
                    }),
                    duration: Duration::ZERO,
                },
            ],
            duration: Duration::ZERO,
        };

        let tally = report.tally();
        assert_eq!(tally.total, 2);
        assert_eq!(tally.succeeded + tally.skipped + tally.failed, tally.total);
        assert!(report.has_failures());
    }
}
