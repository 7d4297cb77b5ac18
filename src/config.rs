//! Configuration types for CLI verbosity and git options.

use crate::constants;
use crate::git::{self, GitLogger};
use std::time::Duration;

/// Runtime configuration derived from CLI arguments and the environment.
///
/// Passed by reference to every operation that shells out to git, so the
/// timeout and logging choice are decided once per run.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
    /// Upper bound for a single git invocation.
    pub git_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            git_timeout: Duration::from_secs(constants::DEFAULT_GIT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Builds a config from verbosity flags and an optional timeout override.
    ///
    /// Without an override the timeout comes from `NODEKEEPER_GIT_TIMEOUT`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool, timeout_secs: Option<u64>) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        let git_timeout = timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(constants::git_timeout);

        Self {
            verbosity,
            git_timeout,
        }
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config only chooses which logger to use; the loggers themselves live
    /// in the git module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
