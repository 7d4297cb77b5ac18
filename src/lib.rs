//! Operator utilities for a directory of plugin git repositories.
//!
//! This crate provides the pieces behind the `nk-*` binaries:
//! - Safely pulling every repository, skipping ones with local changes
//! - Building an HTML index of repositories and their remotes
//! - Shallow-cloning repositories listed in such an index
//! - Listing configured remotes
//! - Finding package version conflicts across requirements files

pub mod analyzer;
pub mod cli;
pub mod clone;
pub mod config;
pub mod constants;
pub mod error;
pub mod git;
pub mod index;
pub mod links;
pub mod logging;
pub mod output;
pub mod remotes;
pub mod repo;
pub mod requirements;
pub mod update;
