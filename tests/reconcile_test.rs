mod common;

use common::{Upstream, commit_local, head, make_conflicted, make_dirty, run_git, test_config};
use nodekeeper::output::NoOpCallbacks;
use nodekeeper::repo::RepoRecord;
use nodekeeper::update::{
    self, Action, FailureKind, MSG_CONFLICTS, MSG_DIVERGED, MSG_FAST_FORWARDED, MSG_UNCOMMITTED,
    MSG_UP_TO_DATE, PullOptions, UpdateCallbacks, UpdateOutcome, UpdateResult, UpdateStep,
};
use std::sync::Mutex;
use tempfile::TempDir;

const SAFE: PullOptions = PullOptions {
    force_overwrite: false,
};
const FORCE: PullOptions = PullOptions {
    force_overwrite: true,
};

fn expect_success(outcome: &UpdateOutcome, message: &str, action: Action) {
    match outcome {
        UpdateOutcome::Success(success) => {
            assert_eq!(success.message, message);
            assert_eq!(success.action, action);
        }
        UpdateOutcome::Failed(failure) => panic!("expected success, got {:?}", failure),
    }
}

#[test]
fn test_clean_repo_already_up_to_date() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    expect_success(&result.outcome, MSG_UP_TO_DATE, Action::FastForward);
    assert!(!result.record.dirty && !result.record.conflicted);
    assert_eq!(result.record.branch, "main");
    Ok(())
}

#[test]
fn test_clean_repo_fast_forwards() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    upstream.publish("feature.py", "print('hi')\n")?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    expect_success(&result.outcome, MSG_FAST_FORWARDED, Action::FastForward);
    assert!(repo.join("feature.py").exists());
    assert_eq!(head(&repo)?, run_git(upstream.bare(), &["rev-parse", "main"])?);
    Ok(())
}

#[test]
fn test_dirty_repo_is_left_untouched() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    upstream.publish("feature.py", "print('hi')\n")?;
    make_dirty(&repo)?;
    let before_head = head(&repo)?;
    let before_readme = std::fs::read(repo.join("README.md"))?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    let UpdateOutcome::Failed(failure) = &result.outcome else {
        panic!("dirty repository must not be updated");
    };
    assert_eq!(failure.message, MSG_UNCOMMITTED);
    assert_eq!(failure.kind, FailureKind::NeedsReview);
    assert_eq!(head(&repo)?, before_head);
    assert_eq!(std::fs::read(repo.join("README.md"))?, before_readme);
    assert!(!repo.join("feature.py").exists());
    Ok(())
}

#[test]
fn test_conflicted_repo_reports_files() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    make_conflicted(&upstream, &repo)?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    let UpdateOutcome::Failed(failure) = &result.outcome else {
        panic!("conflicted repository must not be updated");
    };
    assert_eq!(failure.message, MSG_CONFLICTS);
    assert_eq!(failure.conflicts, vec!["README.md".to_string()]);
    assert!(result.record.conflicted);
    Ok(())
}

#[test]
fn test_force_overwrite_matches_remote() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    make_conflicted(&upstream, &repo)?;

    let result = update::reconcile(&repo, FORCE, &NoOpCallbacks, &test_config());

    assert!(result.outcome.is_success());
    assert_eq!(head(&repo)?, run_git(upstream.bare(), &["rev-parse", "main"])?);
    assert_eq!(std::fs::read_to_string(repo.join("README.md"))?, "# Upstream\n");
    assert!(run_git(&repo, &["diff", "--name-only", "--diff-filter=U"])?.is_empty());
    Ok(())
}

#[test]
fn test_diverged_history_needs_review() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    upstream.publish("remote.txt", "remote\n")?;
    commit_local(&repo, "local.txt", "local\n")?;
    let before = head(&repo)?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    let UpdateOutcome::Failed(failure) = &result.outcome else {
        panic!("diverged repository must not be merged");
    };
    assert_eq!(failure.message, MSG_DIVERGED);
    assert_eq!(head(&repo)?, before);
    Ok(())
}

#[test]
fn test_fetch_failure_is_reported() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    run_git(&repo, &["remote", "set-url", "origin", "/nope/missing.git"])?;

    let result = update::reconcile(&repo, SAFE, &NoOpCallbacks, &test_config());

    let UpdateOutcome::Failed(failure) = &result.outcome else {
        panic!("fetch against a missing remote must fail");
    };
    assert!(failure.message.starts_with("Fetch failed:"));
    assert_eq!(failure.kind, FailureKind::Command);
    Ok(())
}

#[derive(Default)]
struct RecordingCallbacks {
    events: Mutex<Vec<String>>,
}

impl UpdateCallbacks for RecordingCallbacks {
    fn on_update_start(&self, name: &str) {
        self.events.lock().unwrap().push(format!("start {}", name));
    }

    fn on_classified(&self, record: &RepoRecord) {
        self.events
            .lock()
            .unwrap()
            .push(format!("classified dirty={}", record.dirty));
    }

    fn on_step(&self, step: &UpdateStep) {
        self.events.lock().unwrap().push(format!("step {:?}", step));
    }

    fn on_complete(&self, result: &UpdateResult) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {}", result.outcome.is_success()));
    }
}

#[test]
fn test_callbacks_follow_update_steps() -> anyhow::Result<()> {
    let upstream = Upstream::new()?;
    let dir = TempDir::new()?;
    let repo = upstream.clone_into(dir.path(), "node")?;
    let callbacks = RecordingCallbacks::default();

    update::reconcile(&repo, SAFE, &callbacks, &test_config());

    let events = callbacks.events.into_inner().unwrap();
    assert_eq!(
        events,
        vec![
            "start node",
            "step Classifying",
            "classified dirty=false",
            "step Fetching",
            "step Merging",
            "done true",
        ]
    );
    Ok(())
}
