//! Progress bars, colored output, and summary formatting.
//!
//! This module provides visual feedback for every tool: per-repository
//! progress during a pull, per-link results during cloning, and the final
//! summaries and reports.

use crate::analyzer::{Basis, Conflict, NodeUpdates, ScanStats};
use crate::clone::{CloneOptions, CloneOutcome, CloneReport, CloneResult};
use crate::config::Config;
use crate::constants::{CUSTOM_NODES_DIR, PROGRESS_TICK_MS, REQUIREMENTS_FILE};
use crate::remotes::RemoteReport;
use crate::repo::{self, RepoRecord};
use crate::update::{self, RunReport, UpdateCallbacks, UpdateOutcome, UpdateResult, UpdateStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl UpdateCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &UpdateStep) {}
    fn on_complete(&self, _result: &UpdateResult) {}
}

/// Prints a repository header in verbose mode.
pub fn print_repo_header(config: &Config, repo_name: &str) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("\n{}", format!("[{}]", repo_name).white().bold());
}

/// Prints a step progress message in verbose mode.
pub fn print_step(config: &Config, step: &UpdateStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("  {}...", step.to_string().dimmed());
}

/// A bar only when output goes to a terminal; lines printed through a hidden bar are dropped.
fn hidden_or_bar(total: usize, config: &Config, template: &str) -> Option<ProgressBar> {
    if config.is_quiet() || config.is_verbose() || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    Some(bar)
}

/// Callbacks for a pull run: a progress bar in normal mode, step-by-step
/// lines in verbose mode, nothing in quiet mode.
pub struct PullCallbacks {
    bar: Option<ProgressBar>,
    config: Config,
    show_diff: bool,
}

impl PullCallbacks {
    /// Prints above the bar when it is visible.
    fn emit(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None if !self.config.is_quiet() => println!("{}", line),
            None => {}
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl UpdateCallbacks for PullCallbacks {
    fn on_update_start(&self, repo_name: &str) {
        print_repo_header(&self.config, repo_name);
        if let Some(bar) = &self.bar {
            bar.set_prefix(repo_name.to_string());
        }
    }

    fn on_classified(&self, record: &RepoRecord) {
        if !self.show_diff || !(record.dirty || record.conflicted) {
            return;
        }
        let divergence = update::collect_divergence(record, &self.config);
        let print = || print_divergence(record, &divergence);
        match &self.bar {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }

    fn on_step(&self, step: &UpdateStep) {
        print_step(&self.config, step);
        if let Some(bar) = &self.bar {
            bar.set_message(step.to_string());
        }
    }

    fn on_complete(&self, result: &UpdateResult) {
        let line = match &result.outcome {
            UpdateOutcome::Success(s) => format!(
                "  {} {} {}",
                "[SUCCESS]".green().bold(),
                result.path().display(),
                s.message.dimmed()
            ),
            UpdateOutcome::Failed(f) => format!(
                "  {} {} {}",
                "[FAILED]".red().bold(),
                result.path().display(),
                f.message.red()
            ),
        };
        self.emit(&line);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

#[must_use]
pub fn create_pull_callbacks(total: usize, config: &Config, show_diff: bool) -> PullCallbacks {
    PullCallbacks {
        bar: hidden_or_bar(
            total,
            config,
            "{bar:40.cyan/blue} {pos}/{len} {spinner:.cyan} {prefix:.white.bold} {msg}",
        ),
        config: *config,
        show_diff,
    }
}

fn print_divergence(record: &RepoRecord, divergence: &update::Divergence) {
    println!(
        "\n{}",
        format!("--- Local vs Remote Diff for {} ---", record.path.display()).cyan()
    );

    println!("\n{}", "[LOCAL STATUS]".white().bold());
    match divergence.status.as_deref() {
        Some(status) if !status.is_empty() => println!("{}", status),
        _ => println!("No local modifications."),
    }

    println!(
        "\n{}",
        format!("[REMOTE DIFF: {}..HEAD]", divergence.upstream).white().bold()
    );
    match divergence.diff.as_deref() {
        Some(diff) if !diff.is_empty() => println!("{}", diff),
        _ => println!("No differences."),
    }

    println!("\n{}", "[COMMITS AHEAD/BEHIND]".white().bold());
    match divergence.ahead_behind {
        Some((behind, ahead)) => {
            println!("Local commits ahead of remote: {}", ahead);
            println!("Remote commits ahead of local: {}", behind);
        }
        None => println!("Could not compute ahead/behind."),
    }
    println!("{}\n", "-".repeat(60).dimmed());
}

/// Asks the operator to confirm a destructive force reset.
pub fn confirm_force_overwrite(count: usize) -> anyhow::Result<bool> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!(
            "Force overwrite will discard local changes in {} repositories. Continue?",
            count
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Scanning for Git repositories under:".cyan(),
        path.display().to_string().white().bold()
    )
}

pub fn print_no_repos(config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!("{}", "No git repositories found".yellow().bold())
}

pub fn print_pull_summary(report: &RunReport, config: &Config) {
    if config.is_quiet() {
        print_quiet_pull_summary(report);
    } else {
        print_normal_pull_summary(report);
    }
}

fn print_quiet_pull_summary(report: &RunReport) {
    let tally = report.tally();
    println!("{}/{} repositories updated", tally.succeeded, tally.total);

    for result in report.needing_review() {
        eprintln!(
            "error: {}: {}",
            result.path().display(),
            result.outcome.message()
        );
    }
}

fn print_normal_pull_summary(report: &RunReport) {
    print_section("Summary");
    let tally = report.tally();

    println!("Total repositories found: {}", tally.total);
    println!(
        "Successfully updated:     {}",
        tally.succeeded.to_string().green()
    );
    println!("Skipped:                  {}", tally.skipped);
    let failed = tally.failed.to_string();
    println!(
        "Need manual review:       {}",
        if tally.failed > 0 { failed.red() } else { failed.normal() }
    );
    println!("Elapsed:                  {}", format_duration(report.duration));

    if !report.has_failures() {
        return;
    }

    println!(
        "\n{}\n",
        "Repositories requiring manual review:".red().bold()
    );
    for result in report.needing_review() {
        print_review_entry(result);
    }
}

fn print_review_entry(result: &UpdateResult) {
    let UpdateOutcome::Failed(failure) = &result.outcome else {
        return;
    };
    println!("- {}", result.path().display().to_string().white());
    println!("    Reason: {}", failure.message.red());
    if !failure.conflicts.is_empty() {
        println!("    Conflicts:");
        for file in &failure.conflicts {
            println!("      - {}", file);
        }
    }
    println!();
}

/// Live reporting of clone results.
pub struct CloneProgress {
    bar: Option<ProgressBar>,
    config: Config,
}

impl CloneProgress {
    fn emit(&self, line: &str, to_stderr: bool) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None if self.config.is_quiet() && !to_stderr => {}
            None if to_stderr => eprintln!("{}", line),
            None => println!("{}", line),
        }
    }

    /// Reports one finished clone. Safe to call from worker threads.
    pub fn on_complete(&self, result: &CloneResult) {
        match &result.outcome {
            CloneOutcome::Cloned => {
                self.emit(&format!("{} {}", "[OK]".green().bold(), result.link.name), false)
            }
            CloneOutcome::Skipped { dest } => self.emit(
                &format!(
                    "{} {} (already exists: {})",
                    "[SKIP]".yellow().bold(),
                    result.link.name,
                    dest.display()
                ),
                false,
            ),
            CloneOutcome::Planned { actions } => {
                for action in actions {
                    self.emit(&format!("{} {}", "[DRY-RUN]".cyan().bold(), action), false);
                }
            }
            CloneOutcome::Failed { .. } => self.emit(
                &format!(
                    "{} {} ({})",
                    "[FAIL]".red().bold(),
                    result.link.name,
                    result.link.url
                ),
                true,
            ),
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[must_use]
pub fn create_clone_progress(total: usize, config: &Config) -> CloneProgress {
    CloneProgress {
        bar: hidden_or_bar(
            total,
            config,
            "{bar:40.cyan/blue} {pos}/{len} cloned {spinner:.cyan} {msg}",
        ),
        config: *config,
    }
}

pub fn print_clone_header(found: usize, html: &Path, options: &CloneOptions, config: &Config) {
    if config.is_quiet() {
        return;
    }
    let target = std::fs::canonicalize(&options.target).unwrap_or_else(|_| options.target.clone());
    println!("Found {} repositories in {}", found, html.display());
    println!("Target directory: {}", target.display().to_string().white().bold());
    println!(
        "{}\n",
        format!(
            "Clone depth: {} | jobs: {} | force: {} | dry-run: {}",
            options.depth, options.jobs, options.force, options.dry_run
        )
        .dimmed()
    );
}

pub fn print_clone_summary(report: &CloneReport, config: &Config) {
    let tally = report.tally();

    if config.is_quiet() {
        println!(
            "{} cloned, {} skipped, {} failed",
            tally.cloned, tally.skipped, tally.failed
        );
    } else {
        print_section("Summary");
        println!("  OK:   {}", tally.cloned.to_string().green());
        println!("  SKIP: {}", tally.skipped.to_string().yellow());
        println!("  FAIL: {}", tally.failed.to_string().red());
        if tally.planned > 0 {
            println!("  PLAN: {}", tally.planned.to_string().cyan());
        }
        println!("  in {}", format_duration(report.duration).dimmed());
    }

    let mut failures = report.failures().peekable();
    if failures.peek().is_none() {
        return;
    }
    eprintln!("\n{}", "Failures (details):".red().bold());
    for result in failures {
        if let CloneOutcome::Failed { error } = &result.outcome {
            eprintln!("- {}: {}", result.link.name, error);
        }
    }
}

pub fn print_index_written(output: &Path, count: usize, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {} ({} repositories)",
        "Generated HTML file at:".green(),
        output.display().to_string().white().bold(),
        count
    );
}

pub fn print_remote_reports(reports: &[RemoteReport], config: &Config) {
    if reports.is_empty() {
        if !config.is_quiet() {
            println!("\n{}", "[INFO] No Git repositories found in subdirectories.".yellow());
        }
        return;
    }

    for report in reports {
        println!(
            "\n{} {}",
            "Repository:".cyan(),
            repo::repo_name(&report.path).white().bold()
        );
        match &report.remotes {
            Ok(remotes) if remotes.is_empty() => println!("  No remotes configured."),
            Ok(remotes) => {
                for remote in remotes {
                    println!("  Remote: {}", remote.name.white().bold());
                    println!(
                        "    Fetch (Pull): {}",
                        remote.fetch_url.as_deref().unwrap_or("[Not Set]")
                    );
                    println!(
                        "    Push (Send):  {}",
                        remote.push_url.as_deref().unwrap_or("[Not Set]")
                    );
                }
            }
            Err(err) => eprintln!("  {} {}", "[ERROR]".red().bold(), err),
        }
    }

    if !config.is_quiet() {
        println!(
            "\n{}",
            format!("--- Scan Complete: Found {} repositories ---", reports.len()).dimmed()
        );
    }
}

pub fn print_scan_stats(reference: &Path, reference_found: bool, stats: &ScanStats, config: &Config) {
    if config.is_quiet() {
        return;
    }
    if reference_found {
        println!("  {} Loaded reference {}", "✓".green(), reference.display());
    } else {
        println!("  {} {} not found", "⚠".yellow(), reference.display());
    }
    println!("  Scanned {} custom nodes", stats.nodes);
    println!("  Found {} requirements.txt files\n", stats.requirement_files);
}

pub fn print_conflict_summary(conflicts: &[Conflict], config: &Config) {
    if config.is_quiet() {
        return;
    }
    print_section("Package Compatibility Summary");

    if conflicts.is_empty() {
        println!(
            "{}\n",
            "No conflicts found! All packages have consistent versions.".green()
        );
        return;
    }

    println!(
        "{}\n",
        format!("Found {} packages with version conflicts", conflicts.len()).yellow()
    );
    for conflict in conflicts {
        match &conflict.reference {
            Some(reference) => println!(
                "  • {}: {} versions found (reference: {})",
                conflict.package,
                conflict.versions.len(),
                reference.version
            ),
            None => println!(
                "  • {}: {} versions found (no reference)",
                conflict.package,
                conflict.versions.len()
            ),
        }
    }
    println!();
}

fn basis_marker(basis: Basis) -> &'static str {
    match basis {
        Basis::Reference => "🎯",
        Basis::MostCommon => "📊",
    }
}

pub fn print_node_recommendations(updates: &NodeUpdates, config: &Config) {
    if config.is_quiet() {
        return;
    }
    print_section("Recommended Package Updates By Custom Node");

    if updates.is_empty() {
        println!("{}\n", "No updates needed for custom nodes!".green());
        return;
    }

    println!("Found {} custom nodes with package conflicts\n", updates.len());
    for (node, list) in updates {
        println!("{}", "─".repeat(80).dimmed());
        println!("📁 Custom Node: {}", node.white().bold());
        println!(
            "   Location: {}/{}/{}",
            CUSTOM_NODES_DIR, node, REQUIREMENTS_FILE
        );
        println!("   Packages to update: {}\n", list.len());

        println!("   Current → Recommended:");
        for rec in list {
            println!(
                "     {} {}: {} → {}",
                basis_marker(rec.basis),
                rec.package,
                rec.current.red(),
                rec.recommended.green()
            );
        }

        println!("\n   📋 Recommended lines:");
        println!("   {}", "─".repeat(76).dimmed());
        for rec in list {
            println!("   {}=={}", rec.package, rec.recommended);
        }
        println!("   {}\n", "─".repeat(76).dimmed());
    }

    println!("Legend:");
    println!("  🎯 = Version from the reference requirements file");
    println!("  📊 = Most common version (no reference available)\n");
}

pub fn print_analysis_summary(
    packages: usize,
    conflicts: usize,
    nodes: usize,
    references: usize,
    exported: Option<&Path>,
    config: &Config,
) {
    if config.is_quiet() {
        println!(
            "{} packages, {} conflicts, {} nodes need updates",
            packages, conflicts, nodes
        );
        return;
    }
    if let Some(path) = exported {
        println!("Recommendations exported to: {}\n", path.display());
    }
    print_section("Summary");
    println!("Total packages analyzed: {}", packages);
    println!("Packages with conflicts: {}", conflicts);
    println!("Custom nodes needing updates: {}", nodes);
    println!("Reference packages: {}", references);
    if nodes == 0 {
        println!("\n{}", "All packages are compatible.".green());
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = 50usize.saturating_sub(title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}
