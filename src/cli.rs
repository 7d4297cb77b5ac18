//! Command-line arguments for the nodekeeper binaries.

use crate::config::Config;
use crate::constants::{CUSTOM_NODES_DIR, INDEX_FILE};
use clap::{Args, Parser};
use std::path::PathBuf;

/// Flags shared by every tool.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Minimal output: counts on stdout, errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show every git command and step
    #[arg(short, long)]
    pub verbose: bool,

    /// Timeout in seconds for each git command [default: NODEKEEPER_GIT_TIMEOUT or 60]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Emit diagnostic logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

impl CommonArgs {
    #[must_use]
    pub fn config(&self) -> Config {
        Config::from_flags(self.quiet, self.verbose, self.timeout)
    }
}

/// Safely update every git repository under the custom nodes directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "nk-pull", version)]
pub struct PullArgs {
    /// Root directory searched recursively for repositories
    #[arg(long, default_value = CUSTOM_NODES_DIR)]
    pub root: PathBuf,

    /// Show local vs remote differences for dirty or conflicted repositories
    #[arg(long)]
    pub show_diff: bool,

    /// Overwrite local changes with the remote branch via `git reset --hard`
    #[arg(long)]
    pub force_overwrite: bool,

    /// Do not ask for confirmation before a force overwrite
    #[arg(short = 'y', long, requires = "force_overwrite")]
    pub yes: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Clone repositories from an HTML list of links (shallow).
#[derive(Parser, Debug, Clone)]
#[command(name = "nk-clone", version)]
pub struct CloneArgs {
    /// HTML file containing <a href=...> links
    #[arg(long)]
    pub html: PathBuf,

    /// Target custom nodes directory
    #[arg(long, default_value = "./custom_nodes")]
    pub target: PathBuf,

    /// Shallow clone depth
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: u32,

    /// Delete existing repository folders and re-clone
    #[arg(long)]
    pub force: bool,

    /// Also fetch submodules
    #[arg(long)]
    pub recurse_submodules: bool,

    /// Parallel clone jobs
    #[arg(long, default_value_t = 1)]
    pub jobs: usize,

    /// Print actions without cloning
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Generate an HTML page listing each repository and its origin URL.
#[derive(Parser, Debug, Clone)]
#[command(name = "nk-index", version)]
pub struct IndexArgs {
    /// Directory whose immediate subdirectories are listed
    #[arg(long, default_value = CUSTOM_NODES_DIR)]
    pub dir: PathBuf,

    /// Output HTML file, overwritten on each run
    #[arg(long, short, default_value = INDEX_FILE)]
    pub output: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Show the fetch and push URLs of every repository in a directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "nk-remotes", version)]
pub struct RemotesArgs {
    /// Directory whose immediate subdirectories are checked
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Analyze package version conflicts across custom node requirements.
#[derive(Parser, Debug, Clone)]
#[command(name = "nk-reqs", version)]
pub struct ReqsArgs {
    /// Base directory containing the reference file and the custom_nodes folder
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Reference requirements file (default: good-uv-requirements.txt in --dir)
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Don't export recommendations to package_updates.txt
    #[arg(long)]
    pub no_export: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}
