//! Package-version conflict analysis across plugin requirements files.
//!
//! Declarations from the reference file and from every
//! `custom_nodes/<node>/requirements.txt` are pooled per package. A package
//! seen with more than one version string is a conflict, and each plugin
//! entry that disagrees with the recommended version becomes a suggested edit.

use crate::constants::{CUSTOM_NODES_DIR, REFERENCE_REQUIREMENTS, REQUIREMENTS_FILE};
use crate::error::NodesError;
use crate::requirements::{self, Requirement};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a recommended version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    Reference,
    MostCommon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub package: String,
    /// Distinct versions in first-seen order, each with the files declaring it.
    pub versions: Vec<(String, Vec<PathBuf>)>,
    pub reference: Option<Requirement>,
    pub entries: Vec<Requirement>,
}

impl Conflict {
    /// Reference version when there is one, otherwise the most frequent
    /// version; ties go to the version seen first.
    #[must_use]
    pub fn recommended(&self) -> (String, Basis) {
        if let Some(reference) = &self.reference {
            return (reference.version.clone(), Basis::Reference);
        }

        let mut best: Option<(&str, usize)> = None;
        for (version, sources) in &self.versions {
            if best.is_none_or(|(_, count)| sources.len() > count) {
                best = Some((version.as_str(), sources.len()));
            }
        }
        let version = best.map(|(v, _)| v.to_string()).unwrap_or_default();
        (version, Basis::MostCommon)
    }
}

/// A suggested edit to one plugin's requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub package: String,
    pub current: String,
    pub recommended: String,
    pub basis: Basis,
    pub file: PathBuf,
}

/// Recommendations keyed by plugin directory name, each list sorted by package.
pub type NodeUpdates = BTreeMap<String, Vec<Recommendation>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub nodes: usize,
    pub requirement_files: usize,
}

#[derive(Debug)]
pub struct PackageAnalyzer {
    base_dir: PathBuf,
    reference_path: PathBuf,
    packages: BTreeMap<String, Vec<Requirement>>,
    reference: HashMap<String, Requirement>,
}

impl PackageAnalyzer {
    /// `reference` defaults to `good-uv-requirements.txt` inside `base_dir`.
    #[must_use]
    pub fn new(base_dir: &Path, reference: Option<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            reference_path: reference.unwrap_or_else(|| base_dir.join(REFERENCE_REQUIREMENTS)),
            packages: BTreeMap::new(),
            reference: HashMap::new(),
        }
    }

    #[must_use]
    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    #[must_use]
    pub fn nodes_dir(&self) -> PathBuf {
        self.base_dir.join(CUSTOM_NODES_DIR)
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.reference.len()
    }

    /// Records reference declarations; the first declaration of a package wins.
    pub fn add_reference(&mut self, reqs: Vec<Requirement>) {
        for req in reqs {
            self.reference
                .entry(req.name.clone())
                .or_insert_with(|| req.clone());
            self.packages.entry(req.name.clone()).or_default().push(req);
        }
    }

    pub fn add_plugin(&mut self, reqs: Vec<Requirement>) {
        for req in reqs {
            self.packages.entry(req.name.clone()).or_default().push(req);
        }
    }

    /// Loads the reference file. Returns `Ok(false)` when it does not exist.
    pub fn load_reference(&mut self) -> Result<bool, NodesError> {
        if !self.reference_path.is_file() {
            return Ok(false);
        }
        let reqs = requirements::load_file(&self.reference_path)?;
        self.add_reference(reqs);
        Ok(true)
    }

    /// Loads every plugin requirements file, visiting plugin directories in name order.
    ///
    /// Unreadable files are logged and skipped. A missing nodes directory
    /// yields empty stats.
    pub fn scan_custom_nodes(&mut self) -> ScanStats {
        let mut stats = ScanStats::default();
        let nodes_dir = self.nodes_dir();

        let Ok(entries) = std::fs::read_dir(&nodes_dir) else {
            tracing::warn!(path = %nodes_dir.display(), "custom nodes directory not found");
            return stats;
        };

        let mut node_dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        node_dirs.sort();

        for node_dir in node_dirs {
            stats.nodes += 1;
            let req_file = node_dir.join(REQUIREMENTS_FILE);
            if !req_file.is_file() {
                continue;
            }
            stats.requirement_files += 1;
            match requirements::load_file(&req_file) {
                Ok(reqs) => self.add_plugin(reqs),
                Err(err) => tracing::warn!(error = %err, "skipping requirements file"),
            }
        }

        stats
    }

    /// Packages declared with more than one distinct version, sorted by name.
    #[must_use]
    pub fn analyze_conflicts(&self) -> Vec<Conflict> {
        self.packages
            .iter()
            .filter_map(|(package, entries)| {
                let mut versions: Vec<(String, Vec<PathBuf>)> = Vec::new();
                for entry in entries {
                    match versions.iter_mut().find(|(v, _)| *v == entry.version) {
                        Some((_, sources)) => sources.push(entry.source.clone()),
                        None => versions.push((entry.version.clone(), vec![entry.source.clone()])),
                    }
                }

                (versions.len() > 1).then(|| Conflict {
                    package: package.clone(),
                    versions,
                    reference: self.reference.get(package).cloned(),
                    entries: entries.clone(),
                })
            })
            .collect()
    }

    /// Plugin directory that `source` belongs to, if it is a plugin file.
    fn node_of(&self, source: &Path) -> Option<String> {
        source
            .strip_prefix(self.nodes_dir())
            .ok()?
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .map(str::to_string)
    }

    /// Suggested edits grouped by plugin, skipping entries already at the recommended version.
    #[must_use]
    pub fn recommendations(&self, conflicts: &[Conflict]) -> NodeUpdates {
        let mut updates = NodeUpdates::new();

        for conflict in conflicts {
            let (recommended, basis) = conflict.recommended();
            for entry in &conflict.entries {
                if entry.version == recommended {
                    continue;
                }
                let Some(node) = self.node_of(&entry.source) else {
                    continue;
                };
                updates.entry(node).or_default().push(Recommendation {
                    package: conflict.package.clone(),
                    current: entry.version.clone(),
                    recommended: recommended.clone(),
                    basis,
                    file: entry.source.clone(),
                });
            }
        }

        for list in updates.values_mut() {
            list.sort_by(|a, b| a.package.cmp(&b.package));
        }
        updates
    }
}

/// Writes the plain-text report listing recommended lines per plugin.
pub fn write_report<W: fmt::Write>(out: &mut W, updates: &NodeUpdates) -> fmt::Result {
    let rule = "=".repeat(80);
    let thin = "-".repeat(40);

    writeln!(out, "ComfyUI Package Compatibility - Recommended Updates")?;
    writeln!(out, "{}\n", rule)?;

    for (node, list) in updates {
        writeln!(out, "Custom Node: {}", node)?;
        writeln!(out, "Location: {}/{}/{}", CUSTOM_NODES_DIR, node, REQUIREMENTS_FILE)?;
        writeln!(out, "Packages to update: {}\n", list.len())?;

        writeln!(out, "Recommended package versions:")?;
        writeln!(out, "{}", thin)?;
        for rec in list {
            writeln!(out, "{}=={}", rec.package, rec.recommended)?;
        }
        writeln!(out, "{}\n", thin)?;

        writeln!(out, "Current versions:")?;
        for rec in list {
            writeln!(out, "  {}: {} → {}", rec.package, rec.current, rec.recommended)?;
        }
        writeln!(out, "\n{}\n", rule)?;
    }

    Ok(())
}

#[must_use]
pub fn render_report(updates: &NodeUpdates) -> String {
    let mut out = String::new();
    // A String sink never reports an error.
    write_report(&mut out, updates).map_or_else(|_| String::new(), |()| out)
}

/// Writes the report, replacing any earlier file.
pub fn export_report(updates: &NodeUpdates, path: &Path) -> Result<(), NodesError> {
    std::fs::write(path, render_report(updates)).map_err(|source| NodesError::Write {
        path: path.to_path_buf(),
        source,
    })
}
