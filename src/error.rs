//! Run-level errors that abort a whole invocation.
//!
//! Per-repository and per-clone failures are never represented here; they are
//! recorded as outcomes and the run continues.

use std::path::PathBuf;
use thiserror::Error;

use crate::constants::exit;
use crate::git::GitError;

#[derive(Debug, Error)]
pub enum NodesError {
    #[error("directory not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("input document not found: {}", path.display())]
    InputMissing { path: PathBuf },

    #[error("no repository links found in {}", path.display())]
    NoLinks { path: PathBuf },

    #[error(transparent)]
    GitUnavailable(GitError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NodesError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            NodesError::RootNotFound { .. } | NodesError::InputMissing { .. } => exit::INPUT_MISSING,
            NodesError::NoLinks { .. } => exit::NO_LINKS,
            NodesError::GitUnavailable(_) => exit::GIT_UNAVAILABLE,
            NodesError::Read { .. } | NodesError::Write { .. } => exit::FAILURES,
        }
    }
}

/// Checks git can be launched before any work starts.
pub fn require_git() -> Result<String, NodesError> {
    crate::git::ensure_available().map_err(NodesError::GitUnavailable)
}

/// Exit code for an error that ended a run.
#[must_use]
pub fn exit_code_of(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<NodesError>()
        .map_or(exit::FAILURES, NodesError::exit_code)
}
