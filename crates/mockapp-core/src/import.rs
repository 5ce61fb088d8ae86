//! Import module graphs from dependency dumps in dot format.
//!
//! The input is the edge-statement subset of a dot file, as produced by a
//! build system dependency query:
//!
//! ```text
//! digraph result_graph {
//!   "//apps/main:App" -> "//libs/net:Networking";
//!   "//libs/net:Networking" -> "//libs/core:Core";
//! }
//! ```
//!
//! Each `->` line is one edge meaning "origin depends on destination".
//! Everything else (node attributes, braces, comments) is ignored. Lines that
//! mention non-code targets (tests, schemes, asset catalogs, ...) are dropped
//! before parsing so they do not inflate the generated code volume.
//!
//! Qualified target names are reduced to their leaf (`//a/b:name` → `name`).
//! Two different qualified names with the same leaf would silently merge
//! into one module, so that case is rejected as ambiguous.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::error::{BuildGraphError, GraphError};
use crate::model::{ModuleGraph, ModuleId, ModuleNode};
use crate::topo::toposort_flatten;

/// Substrings (matched case-insensitively) that mark a line as a non-code
/// target edge.
pub const DEFAULT_MODULE_FILTER: &[&str] = &[
    "test",
    "scheme",
    "assetcatalog",
    "resources",
    "fixture",
    "needle",
    "assets",
];

/// Replacement name for the root module in anonymized edge lists.
pub const ANONYMOUS_ROOT_NAME: &str = "ImportedMainModule";

/// Prefix for anonymized library names, followed by a first-seen index.
pub const ANONYMOUS_LIB_PREFIX: &str = "ImportedLib";

/// `(origin, destination)`: origin depends on destination.
pub type Edge = (String, String);

/// Outgoing edge map: module → modules it depends on, without duplicates.
pub type DepMap = BTreeMap<String, Vec<String>>;

/// Parser for dot dependency dumps.
#[derive(Debug, Clone)]
pub struct DotImporter {
    filter: Vec<String>,
}

impl Default for DotImporter {
    fn default() -> Self {
        Self::with_filter(DEFAULT_MODULE_FILTER.iter().copied())
    }
}

impl DotImporter {
    /// An importer using [`DEFAULT_MODULE_FILTER`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An importer that drops lines containing any of `filter`. An empty
    /// filter keeps every edge.
    #[must_use]
    pub fn with_filter<I, S>(filter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filter: filter
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn is_filtered(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.filter.iter().any(|word| lower.contains(word.as_str()))
    }

    /// Raw `(origin, destination)` pairs from every unfiltered `->` line,
    /// with quotes, trailing `;` and surrounding whitespace removed.
    #[must_use]
    pub fn extract_edges(&self, text: &str) -> Vec<Edge> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| line.contains("->") && !self.is_filtered(line))
            .filter_map(|(idx, line)| {
                let edge = parse_edge_line(line);
                if edge.is_none() {
                    warn!(
                        line = idx + 1,
                        text = line.trim(),
                        "skipping malformed edge statement"
                    );
                }
                edge
            })
            .collect()
    }

    /// Extracted edges reduced to leaf names.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AmbiguousNames`] if distinct qualified targets
    /// share a leaf name, since reducing them would merge unrelated modules.
    pub fn clean_edges(&self, text: &str) -> Result<Vec<Edge>, GraphError> {
        let raw = self.extract_edges(text);
        let ambiguous = identical_names(&raw);
        if !ambiguous.is_empty() {
            debug!(names = ?ambiguous, "distinct targets share a leaf name");
            return Err(GraphError::AmbiguousNames(ambiguous));
        }
        Ok(clean_edge_names(&raw))
    }

    /// Parse `text` and build a graph whose app is the node named `root`.
    ///
    /// Nodes are materialized in first-seen order, then re-ordered
    /// topologically with the app last.
    ///
    /// # Errors
    ///
    /// - [`GraphError::AmbiguousNames`] if distinct targets share a leaf name.
    /// - [`GraphError::UnresolvedRoot`] if no edge mentions `root`.
    /// - [`GraphError::Cyclic`] if the edges contain a cycle.
    /// - [`GraphError::Invalid`] if some module depends on `root`.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn import_str(&self, text: &str, root: &str) -> Result<ModuleGraph, GraphError> {
        let edges = self.clean_edges(text)?;
        let deps = dep_map(&edges);
        let order = first_seen_names(&edges);
        debug!(edges = edges.len(), modules = order.len(), "parsed dot edges");

        let Some(app_index) = order.iter().position(|name| name == root) else {
            return Err(GraphError::UnresolvedRoot(root.to_string()));
        };

        // Cycles (self loops included) are reported by name before the arena
        // is built.
        let named: BTreeMap<&str, BTreeSet<&str>> = deps
            .iter()
            .map(|(origin, dests)| {
                (
                    origin.as_str(),
                    dests.iter().map(String::as_str).collect(),
                )
            })
            .collect();
        toposort_flatten(&named)?;

        let ids: HashMap<&str, ModuleId> = order
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), ModuleId(idx)))
            .collect();
        let nodes: Vec<ModuleNode> = order
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let node_deps: Vec<ModuleId> = deps
                    .get(name)
                    .into_iter()
                    .flatten()
                    .filter_map(|dep| ids.get(dep.as_str()).copied())
                    .collect();
                if idx == app_index {
                    ModuleNode::app(name.clone(), node_deps)
                } else {
                    ModuleNode::library(name.clone()).with_deps(node_deps)
                }
            })
            .collect();

        let graph = ModuleGraph::new(nodes, ModuleId(app_index))?.topologically_sorted()?;
        info!(
            root,
            modules = graph.len(),
            edges = graph.edge_count(),
            "imported dot graph"
        );
        Ok(graph)
    }

    /// Read the file at `path` and import it with [`import_str`](Self::import_str).
    ///
    /// # Errors
    ///
    /// Returns [`BuildGraphError::ReadDot`] if the file cannot be read, or the
    /// graph errors of [`import_str`](Self::import_str).
    pub fn import_file(&self, path: &Path, root: &str) -> Result<ModuleGraph, BuildGraphError> {
        info!(path = %path.display(), "reading dot file");
        let text = std::fs::read_to_string(path).map_err(|source| BuildGraphError::ReadDot {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.import_str(&text, root)?)
    }
}

fn parse_edge_line(line: &str) -> Option<Edge> {
    let line = line.trim();
    let line = line.strip_suffix(';').unwrap_or(line);
    let mut parts = line.split("->");
    let origin = clean_name(parts.next()?);
    let destination = clean_name(parts.next()?);
    if parts.next().is_some() || origin.is_empty() || destination.is_empty() {
        return None;
    }
    Some((origin, destination))
}

fn clean_name(part: &str) -> String {
    part.trim().replace('"', "")
}

/// Leaf name of a qualified target: `//a/b:name` → `name`.
///
/// Text that does not split into exactly two parts on `:` is returned
/// unchanged.
#[must_use]
pub fn extract_target(text: &str) -> &str {
    match text.split_once(':') {
        Some((_, leaf)) if !leaf.contains(':') => leaf,
        _ => text,
    }
}

/// Reduce both endpoints of every edge to their leaf names.
#[must_use]
pub fn clean_edge_names(edges: &[Edge]) -> Vec<Edge> {
    edges
        .iter()
        .map(|(origin, destination)| {
            (
                extract_target(origin).to_string(),
                extract_target(destination).to_string(),
            )
        })
        .collect()
}

/// Leaf names shared by more than one distinct qualified name, sorted.
#[must_use]
pub fn identical_names(edges: &[Edge]) -> Vec<String> {
    let mut qualified: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (origin, destination) in edges {
        for name in [origin, destination] {
            qualified
                .entry(extract_target(name))
                .or_default()
                .insert(name.as_str());
        }
    }
    qualified
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(leaf, _)| leaf.to_string())
        .collect()
}

/// Outgoing edge map from an edge list. Repeated edges are kept once, in
/// first-seen order.
#[must_use]
pub fn dep_map(edges: &[Edge]) -> DepMap {
    let mut map = DepMap::new();
    for (origin, destination) in edges {
        let deps = map.entry(origin.clone()).or_default();
        if !deps.contains(destination) {
            deps.push(destination.clone());
        }
    }
    map
}

/// Inverse of [`dep_map`]: module → modules that depend on it. Modules with
/// no dependents (roots) are present with an empty list.
#[must_use]
pub fn incoming_edge_map(deps: &DepMap) -> DepMap {
    let mut incoming = DepMap::new();
    for (origin, destinations) in deps {
        incoming.entry(origin.clone()).or_default();
        for destination in destinations {
            incoming
                .entry(destination.clone())
                .or_default()
                .push(origin.clone());
        }
    }
    incoming
}

fn first_seen_names(edges: &[Edge]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    for (origin, destination) in edges {
        for name in [origin, destination] {
            if seen.insert(name.as_str()) {
                order.push(name.clone());
            }
        }
    }
    order
}

/// Replace module names so an edge list can be shared without revealing
/// them. `root` becomes [`ANONYMOUS_ROOT_NAME`]; every other name becomes
/// `ImportedLib<N>` numbered in first-seen order.
#[must_use]
pub fn anonymize_edges(edges: &[Edge], root: &str) -> Vec<Edge> {
    let mut names: HashMap<&str, String> = HashMap::new();
    names.insert(root, ANONYMOUS_ROOT_NAME.to_string());
    let mut next = 0_usize;
    edges
        .iter()
        .map(|(origin, destination)| {
            let origin = anonymous_name(&mut names, &mut next, origin);
            let destination = anonymous_name(&mut names, &mut next, destination);
            (origin, destination)
        })
        .collect()
}

fn anonymous_name<'a>(names: &mut HashMap<&'a str, String>, next: &mut usize, name: &'a str) -> String {
    names
        .entry(name)
        .or_insert_with(|| {
            let anon = format!("{ANONYMOUS_LIB_PREFIX}{next}");
            *next += 1;
            anon
        })
        .clone()
}

/// Write `edges` as dot edge statements, one per line.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn write_edges<W: Write + ?Sized>(edges: &[Edge], out: &mut W) -> io::Result<()> {
    for (origin, destination) in edges {
        writeln!(out, "\"{origin}\" -> \"{destination}\";")?;
    }
    Ok(())
}
