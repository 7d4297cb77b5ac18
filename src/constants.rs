//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

use std::time::Duration;

/// Default timeout for individual git operations (in seconds).
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding the git timeout (in seconds).
pub const GIT_TIMEOUT_ENV: &str = "NODEKEEPER_GIT_TIMEOUT";

/// Environment variable consulted for the tracing filter.
pub const LOG_ENV: &str = "NODEKEEPER_LOG";

/// Returns the git command timeout.
///
/// Can be customized via the NODEKEEPER_GIT_TIMEOUT environment variable (in seconds).
/// Falls back to 60 seconds if not set or invalid.
///
/// Example: `NODEKEEPER_GIT_TIMEOUT=120 nk-pull`
pub fn git_timeout() -> Duration {
    parse_timeout(std::env::var(GIT_TIMEOUT_ENV).ok().as_deref())
}

fn parse_timeout(value: Option<&str>) -> Duration {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS))
}

/// Progress bar tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Branch assumed when the current branch cannot be determined.
pub const DEFAULT_BRANCH: &str = "main";

/// Remote that updates are fetched from and reset against.
pub const ORIGIN: &str = "origin";

/// Git directory name used to detect repositories.
pub const GIT_DIR: &str = ".git";

/// Default name used when a repository name cannot be determined from its path or URL.
pub const DEFAULT_REPO_NAME: &str = "repo";

/// Directory holding the plugin checkouts.
pub const CUSTOM_NODES_DIR: &str = "custom_nodes";

/// File written by the list builder.
pub const INDEX_FILE: &str = "CustomNodeRepositories.html";

/// Reference requirements file consulted by the analyzer.
pub const REFERENCE_REQUIREMENTS: &str = "good-uv-requirements.txt";

/// Per-plugin requirements file name.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Report written by the analyzer.
pub const REPORT_FILE: &str = "package_updates.txt";

/// Maximum number of characters of git diagnostic text kept in a failure message.
pub const DIAGNOSTIC_LIMIT: usize = 200;

/// Process exit codes shared by the binaries.
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const FAILURES: u8 = 1;
    pub const INPUT_MISSING: u8 = 2;
    pub const NO_LINKS: u8 = 3;
    pub const GIT_UNAVAILABLE: u8 = 4;
}
