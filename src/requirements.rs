//! Requirements-file line grammar.
//!
//! Recognized declarations:
//! - `name==version` (anything after a `+` in the version is dropped)
//! - `name<op>version` for any run of `<`, `>`, `=`, `~`, `!`
//! - bare `name`, recorded with version [`ANY_VERSION`]
//!
//! Blank lines, `#` comments and `git+`/`http` URLs yield nothing; so does
//! anything else the grammar does not recognize.

use crate::error::NodesError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const ANY_VERSION: &str = "any";

static EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_\-\.]+)\s*==\s*([^\s;]+)").unwrap());

static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_\-\.]+)\s*([><=~!]+)\s*([^\s;]+)").unwrap());

static BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_\-\.]+)(?:\s|$)").unwrap());

static LOCAL_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+.*$").unwrap());

/// One package declaration and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Lower-cased package name.
    pub name: String,
    pub version: String,
    pub source: PathBuf,
    pub line: String,
}

fn strip_local_suffix(version: &str) -> String {
    LOCAL_SUFFIX_RE.replace(version, "").into_owned()
}

#[must_use]
pub fn parse_line(line: &str, source: &Path) -> Option<Requirement> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if line.starts_with("git+") || line.starts_with("http") {
        return None;
    }

    let (name, version) = if let Some(caps) = EXACT_RE.captures(line) {
        (caps[1].to_string(), strip_local_suffix(&caps[2]))
    } else if let Some(caps) = OPERATOR_RE.captures(line) {
        (caps[1].to_string(), strip_local_suffix(&caps[3]))
    } else if let Some(caps) = BARE_RE.captures(line) {
        (caps[1].to_string(), ANY_VERSION.to_string())
    } else {
        return None;
    };

    Some(Requirement {
        name: name.to_lowercase(),
        version,
        source: source.to_path_buf(),
        line: line.to_string(),
    })
}

/// Parses every recognized declaration in `path`, in file order.
pub fn load_file(path: &Path) -> Result<Vec<Requirement>, NodesError> {
    let bytes = std::fs::read(path).map_err(|source| NodesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(text
        .lines()
        .filter_map(|line| parse_line(line, path))
        .collect())
}
