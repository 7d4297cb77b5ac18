//! Extraction of `<a href="...">text</a>` pairs from an HTML list.
//!
//! This is not an HTML parser: it understands the anchor convention written
//! by [`crate::index`] and by hand-maintained pages of the same shape.

use crate::constants::DEFAULT_REPO_NAME;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// A repository referenced by the list: destination directory name and clone URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoLink {
    pub name: String,
    pub url: String,
}

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static UNSAFE_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[:*?"<>|]"#).unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static WEB_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Decodes the handful of character references that appear in link lists.
#[must_use]
pub fn unescape_html(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Makes a conservative directory name: no path separators, no characters
/// that are reserved on common filesystems, whitespace collapsed.
#[must_use]
pub fn sanitize_dirname(name: &str) -> String {
    let name = name.trim().replace(['/', '\\'], "_");
    let name = UNSAFE_CHARS_RE.replace_all(&name, "_");
    WHITESPACE_RE.replace_all(&name, " ").trim().to_string()
}

/// Last non-empty path segment of `url` with any `.git` suffix removed.
#[must_use]
pub fn derive_repo_name_from_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split_once('/')
        .map_or("", |(_, path)| path);
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let last = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or_default();
    let last = last.strip_suffix(".git").unwrap_or(last);

    if last.is_empty() {
        DEFAULT_REPO_NAME.to_string()
    } else {
        last.to_string()
    }
}

fn directory_name(text: &str, url: &str) -> String {
    let candidate = if text.is_empty() {
        derive_repo_name_from_url(url)
    } else {
        text.to_string()
    };
    let name = sanitize_dirname(&candidate);
    if name.is_empty() || name == "." || name == ".." {
        sanitize_dirname(&derive_repo_name_from_url(url))
    } else {
        name
    }
}

/// Every anchor with a non-empty `href`, in document order.
#[must_use]
pub fn parse_anchors(html: &str) -> Vec<RepoLink> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let href = HREF_RE.captures(attrs)?;
            let raw_url = href
                .get(1)
                .or_else(|| href.get(2))
                .or_else(|| href.get(3))?
                .as_str();
            let url = unescape_html(raw_url).trim().to_string();
            if url.is_empty() {
                return None;
            }

            let inner = caps.get(2).map_or("", |m| m.as_str());
            let text = unescape_html(&TAG_RE.replace_all(inner, ""))
                .trim()
                .to_string();

            Some(RepoLink {
                name: directory_name(&text, &url),
                url,
            })
        })
        .collect()
}

#[must_use]
pub fn is_web_url(url: &str) -> bool {
    WEB_URL_RE.is_match(url)
}

/// Anchors pointing at `http(s)` URLs, with repeated `(name, url)` pairs dropped.
#[must_use]
pub fn load_links(html: &str) -> Vec<RepoLink> {
    let mut seen = HashSet::new();
    parse_anchors(html)
        .into_iter()
        .filter(|link| is_web_url(&link.url))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
