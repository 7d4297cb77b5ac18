mod common;

use common::{Upstream, head, make_dirty, run_git, test_config};
use nodekeeper::clone::{self, CloneOptions, CloneOutcome};
use nodekeeper::links::RepoLink;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn options(target: &Path) -> CloneOptions {
    CloneOptions {
        target: target.to_path_buf(),
        depth: 1,
        force: false,
        recurse_submodules: false,
        dry_run: false,
        jobs: 1,
    }
}

fn link(name: &str, url: String) -> RepoLink {
    RepoLink {
        name: name.to_string(),
        url,
    }
}

#[test]
fn test_second_run_skips_existing() -> anyhow::Result<()> {
    let config = test_config();
    let upstream = Upstream::new()?;
    let target = TempDir::new()?;
    let links = vec![link("node", upstream.url())];

    let first = clone::clone_all(&links, &options(target.path()), &config, |_| {});
    assert!(matches!(first.results[0].outcome, CloneOutcome::Cloned));
    assert!(target.path().join("node").join("README.md").exists());

    make_dirty(&target.path().join("node"))?;
    let second = clone::clone_all(&links, &options(target.path()), &config, |_| {});

    assert!(matches!(second.results[0].outcome, CloneOutcome::Skipped { .. }));
    assert_eq!(second.tally().skipped, 1);
    let readme = std::fs::read_to_string(target.path().join("node").join("README.md"))?;
    assert_eq!(readme, "# Local edit\n");
    Ok(())
}

#[test]
fn test_force_replaces_existing_checkout() -> anyhow::Result<()> {
    let config = test_config();
    let upstream = Upstream::new()?;
    let target = TempDir::new()?;
    let dest = target.path().join("node");
    std::fs::create_dir_all(&dest)?;
    std::fs::write(dest.join("stale.txt"), "old")?;

    let mut opts = options(target.path());
    opts.force = true;
    let report = clone::clone_all(&[link("node", upstream.url())], &opts, &config, |_| {});

    assert!(matches!(report.results[0].outcome, CloneOutcome::Cloned));
    assert!(!dest.join("stale.txt").exists());
    assert_eq!(head(&dest)?, run_git(upstream.bare(), &["rev-parse", "main"])?);
    Ok(())
}

#[test]
fn test_failed_clone_leaves_no_partial_directory() -> anyhow::Result<()> {
    let config = test_config();
    let target = TempDir::new()?;
    let missing = format!("file://{}", target.path().join("nowhere.git").display());

    let report = clone::clone_all(&[link("ghost", missing)], &options(target.path()), &config, |_| {});

    let CloneOutcome::Failed { error } = &report.results[0].outcome else {
        panic!("clone of a missing remote must fail");
    };
    assert!(error.starts_with("Clone failed for"));
    assert!(!target.path().join("ghost").exists());
    assert_eq!(report.failures().count(), 1);
    Ok(())
}

#[test]
fn test_parallel_clones_keep_input_order() -> anyhow::Result<()> {
    let config = test_config();
    let first = Upstream::new()?;
    let second = Upstream::new()?;
    let third = Upstream::new()?;
    let target = TempDir::new()?;
    let links = vec![
        link("one", first.url()),
        link("two", second.url()),
        link("three", third.url()),
    ];
    let mut opts = options(target.path());
    opts.jobs = 3;
    let completed = AtomicUsize::new(0);

    let report = clone::clone_all(&links, &opts, &config, |_| {
        completed.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(completed.load(Ordering::SeqCst), 3);
    let names: Vec<&str> = report.results.iter().map(|r| r.link.name.as_str()).collect();
    assert_eq!(names, vec!["one", "two", "three"]);
    assert_eq!(report.tally().cloned, 3);
    Ok(())
}

#[test]
fn test_dry_run_touches_nothing() -> anyhow::Result<()> {
    let config = test_config();
    let upstream = Upstream::new()?;
    let target = TempDir::new()?;
    let mut opts = options(&target.path().join("custom_nodes"));
    opts.dry_run = true;

    let report = clone::clone_all(&[link("node", upstream.url())], &opts, &config, |_| {});

    let CloneOutcome::Planned { actions } = &report.results[0].outcome else {
        panic!("dry run must only plan");
    };
    assert_eq!(actions.len(), 1);
    assert!(actions[0].starts_with("git clone --depth 1"));
    assert!(!target.path().join("custom_nodes").exists());
    Ok(())
}

#[test]
fn test_shared_destination_keeps_first_clone_for_any_job_count() -> anyhow::Result<()> {
    let config = test_config();
    let first = Upstream::new()?;
    let second = Upstream::new()?;
    second.publish("fork.txt", "fork\n")?;
    let links = vec![link("dup", first.url()), link("dup", second.url())];

    let mut tallies = Vec::new();
    for jobs in [1, 2] {
        let target = TempDir::new()?;
        let mut opts = options(target.path());
        opts.jobs = jobs;

        let report = clone::clone_all(&links, &opts, &config, |_| {});

        let dest = target.path().join("dup");
        assert!(dest.join("README.md").exists(), "jobs={} lost the clone", jobs);
        assert!(!dest.join("fork.txt").exists());
        assert!(matches!(report.results[0].outcome, CloneOutcome::Cloned));
        assert!(matches!(report.results[1].outcome, CloneOutcome::Skipped { .. }));
        tallies.push(report.tally());
    }

    assert_eq!(tallies[0], tallies[1]);
    assert_eq!((tallies[0].cloned, tallies[0].skipped, tallies[0].failed), (1, 1, 0));
    Ok(())
}
