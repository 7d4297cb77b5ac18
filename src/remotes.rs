// Remote listing for repositories in a directory

use crate::config::Config;
use crate::error::NodesError;
use crate::git::{self, GitError};
use crate::repo;
use std::path::{Path, PathBuf};

/// Fetch and push URLs configured for one remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub fetch_url: Option<String>,
    pub push_url: Option<String>,
}

#[derive(Debug)]
pub struct RemoteReport {
    pub path: PathBuf,
    pub remotes: Result<Vec<Remote>, GitError>,
}

/// Parses `git remote -v` output, keeping remotes in first-seen order.
///
/// Lines that do not have exactly three fields are ignored.
#[must_use]
pub fn parse_remote_listing(output: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [name, url, kind] = parts.as_slice() else {
            continue;
        };

        let index = match remotes.iter().position(|r| r.name == *name) {
            Some(index) => index,
            None => {
                remotes.push(Remote {
                    name: (*name).to_string(),
                    ..Remote::default()
                });
                remotes.len() - 1
            }
        };

        match kind.trim_matches(|c: char| c == '(' || c == ')') {
            "fetch" => remotes[index].fetch_url = Some((*url).to_string()),
            "push" => remotes[index].push_url = Some((*url).to_string()),
            _ => {}
        }
    }

    remotes
}

/// Lists remotes for every repository directly under `dir`.
pub fn check_remotes(dir: &Path, config: &Config) -> Result<Vec<RemoteReport>, NodesError> {
    let logger = config.git_logger();
    let reports = repo::find_immediate_repos(dir)?
        .into_iter()
        .map(|path| {
            let remotes = git::list_remotes(&path, config, logger)
                .map(|output| parse_remote_listing(&output));
            RemoteReport { path, remotes }
        })
        .collect();
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_listing_groups_fetch_and_push() {
        let output = "origin\thttps://github.com/a/b.git (fetch)\n\
                      origin\thttps://github.com/a/b.git (push)\n\
                      upstream\thttps://github.com/up/b.git (fetch)\n\
                      upstream\tno_push (push)";
        let remotes = parse_remote_listing(output);

        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].name, "origin");
        assert_eq!(
            remotes[0].fetch_url.as_deref(),
            Some("https://github.com/a/b.git")
        );
        assert_eq!(
            remotes[0].push_url.as_deref(),
            Some("https://github.com/a/b.git")
        );
        assert_eq!(remotes[1].name, "upstream");
        assert_eq!(remotes[1].push_url.as_deref(), Some("no_push"));
    }

    #[test]
    fn test_parse_remote_listing_ignores_malformed_lines() {
        let remotes = parse_remote_listing("garbage\n\norigin only-two\n");
        assert!(remotes.is_empty());

        let remotes = parse_remote_listing("origin https://x/y.git (push)");
        assert_eq!(remotes[0].fetch_url, None);
    }
}
