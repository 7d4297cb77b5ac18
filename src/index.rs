//! Static HTML index of the checked-out repositories.

use crate::config::Config;
use crate::constants::ORIGIN;
use crate::error::NodesError;
use crate::git;
use crate::links::escape_html;
use crate::repo;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    pub name: String,
    pub url: Option<String>,
}

const STYLE: &str = r#"
        body {
            background: rgb(40, 44, 52);
            color: rgb(171, 178, 191);
            font-family: Arial, sans-serif;
            text-shadow: rgba(0, 0, 0, 0.3) 0px 1px 1px;
            padding: 20px;
        }
        h1 {
            color: rgb(198, 212, 239);
        }
        ul {
            list-style-type: none;
            padding-left: 0;
        }
        li {
            margin: 8px 0;
            font-size: 18px;
        }
        a {
            color: rgb(97, 175, 239);
            text-decoration: none;
        }
        a:hover {
            text-decoration: underline;
        }
        .no-remote {
            color: rgb(180, 100, 100);
        }
"#;

const TITLE: &str = "Custom Node Git Repositories";

/// Reads the `origin` URL of every immediate subdirectory repository of `dir`.
pub fn collect_entries(dir: &Path, config: &Config) -> Result<Vec<RepoEntry>, NodesError> {
    let logger = config.git_logger();
    let entries = repo::find_immediate_repos(dir)?
        .into_iter()
        .map(|path| {
            let url = git::remote_url(&path, config, ORIGIN, logger)
                .ok()
                .filter(|url| !url.is_empty());
            RepoEntry {
                name: repo::repo_name(&path).to_string(),
                url,
            }
        })
        .collect();
    Ok(entries)
}

/// Sorts by URL ascending; entries without a URL go last. Ties keep their order.
pub fn sort_entries(entries: &mut [RepoEntry]) {
    entries.sort_by(|a, b| match (&a.url, &b.url) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[must_use]
pub fn render_html(entries: &[RepoEntry]) -> String {
    let mut lines = vec![
        "<html>".to_string(),
        "<head>".to_string(),
        format!("<title>{}</title>", TITLE),
        "<style>".to_string(),
        STYLE.to_string(),
        "</style>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("<h1>{}</h1>", TITLE),
        "<ul>".to_string(),
    ];

    for entry in entries {
        let name = escape_html(&entry.name);
        match &entry.url {
            Some(url) => lines.push(format!(
                r#"<li><a href="{}" target="_blank">{}</a></li>"#,
                escape_html(url),
                name
            )),
            None => lines.push(format!(
                r#"<li class="no-remote">{} (No remote origin found)</li>"#,
                name
            )),
        }
    }

    lines.extend(["</ul>", "</body>", "</html>"].map(str::to_string));
    lines.join("\n")
}

/// Collects, sorts, renders and writes the index, replacing any previous file.
pub fn write_index(dir: &Path, output: &Path, config: &Config) -> Result<Vec<RepoEntry>, NodesError> {
    let mut entries = collect_entries(dir, config)?;
    sort_entries(&mut entries);

    std::fs::write(output, render_html(&entries)).map_err(|source| NodesError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %output.display(), count = entries.len(), "wrote index");

    Ok(entries)
}
