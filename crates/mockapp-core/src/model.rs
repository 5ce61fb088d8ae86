//! Module dependency graph model.
//!
//! A [`ModuleGraph`] is an arena of [`ModuleNode`]s addressed by
//! [`ModuleId`]. Exactly one node is the application entry point
//! ([`ModuleKind::App`]); every other node is a library. Dependency edges
//! point from a module to the modules it imports.
//!
//! Graphs are validated on construction and immutable afterwards. The node
//! order is significant: generators and the importer hand out graphs whose
//! node list is a topological order (dependencies first, app last), which is
//! what the emitter relies on when it generates call sites into
//! dependencies.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CyclicGraphError, GraphError};
use crate::topo::toposort_flatten;

/// Code units assigned to a "big" module.
pub const BIG_MODULE_CODE_UNITS: u32 = 20;

/// Whether a module is the application entry point or a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModuleKind {
    App,
    Library,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => f.write_str("APP"),
            Self::Library => f.write_str("LIBRARY"),
        }
    }
}

/// Index of a node inside its [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

impl ModuleId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A module in a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub name: String,
    pub kind: ModuleKind,
    /// Modules this module imports, without duplicates.
    pub deps: Vec<ModuleId>,
    /// Relative code volume; 1 is a standard module.
    pub code_units: u32,
}

impl ModuleNode {
    /// A library with no dependencies and one code unit.
    #[must_use]
    pub fn library(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ModuleKind::Library,
            deps: Vec::new(),
            code_units: 1,
        }
    }

    /// An application node depending on `deps`.
    #[must_use]
    pub fn app(name: impl Into<String>, deps: Vec<ModuleId>) -> Self {
        Self {
            name: name.into(),
            kind: ModuleKind::App,
            deps,
            code_units: 1,
        }
    }

    #[must_use]
    pub fn with_deps(mut self, deps: Vec<ModuleId>) -> Self {
        self.deps = deps;
        self
    }

    #[must_use]
    pub const fn with_code_units(mut self, code_units: u32) -> Self {
        self.code_units = code_units;
        self
    }

    #[must_use]
    pub fn is_app(&self) -> bool {
        self.kind == ModuleKind::App
    }

    #[must_use]
    pub fn is_library(&self) -> bool {
        self.kind == ModuleKind::Library
    }
}

impl fmt::Display for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} : {} deps: {} code_units: {}>",
            self.name,
            self.kind,
            self.deps.len(),
            self.code_units
        )
    }
}

/// A validated module dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    app: ModuleId,
}

impl ModuleGraph {
    /// Build a graph from `nodes`, with `app` designating the entry point.
    ///
    /// Duplicate entries inside a node's dependency list are dropped (first
    /// occurrence wins).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Invalid`] when:
    /// - `app` is out of range or not the only [`ModuleKind::App`] node,
    /// - a dependency id is out of range or points at its own node,
    /// - the app node is a dependency of another node,
    /// - two nodes share the same `(name, kind)`.
    pub fn new(mut nodes: Vec<ModuleNode>, app: ModuleId) -> Result<Self, GraphError> {
        let Some(app_node) = nodes.get(app.index()) else {
            return Err(GraphError::Invalid(format!("app id {app} out of range")));
        };
        if !app_node.is_app() {
            return Err(GraphError::Invalid(format!(
                "designated app node {:?} is a {}",
                app_node.name, app_node.kind
            )));
        }

        let mut keys = HashSet::with_capacity(nodes.len());
        let count = nodes.len();
        for (idx, node) in nodes.iter_mut().enumerate() {
            if node.is_app() && idx != app.index() {
                return Err(GraphError::Invalid(format!(
                    "second app node {:?}",
                    node.name
                )));
            }
            if !keys.insert((node.name.clone(), node.kind)) {
                return Err(GraphError::Invalid(format!(
                    "duplicate {} node {:?}",
                    node.kind, node.name
                )));
            }

            let mut seen = HashSet::with_capacity(node.deps.len());
            node.deps.retain(|dep| seen.insert(*dep));
            for dep in &node.deps {
                if dep.index() >= count {
                    return Err(GraphError::Invalid(format!(
                        "{:?} depends on unknown module {dep}",
                        node.name
                    )));
                }
                if dep.index() == idx {
                    return Err(GraphError::Invalid(format!(
                        "{:?} depends on itself",
                        node.name
                    )));
                }
                if *dep == app {
                    return Err(GraphError::Invalid(format!(
                        "{:?} depends on the app node",
                        node.name
                    )));
                }
            }
        }

        Ok(Self { nodes, app })
    }

    #[must_use]
    pub const fn app_id(&self) -> ModuleId {
        self.app
    }

    #[must_use]
    pub fn app(&self) -> &ModuleNode {
        &self.nodes[self.app.index()]
    }

    /// All nodes in graph order.
    #[must_use]
    pub fn nodes(&self) -> &[ModuleNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<ModuleId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(ModuleId)
    }

    /// `(id, node)` pairs in graph order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (ModuleId(idx), node))
    }

    /// Library nodes in graph order.
    pub fn libraries(&self) -> impl Iterator<Item = (ModuleId, &ModuleNode)> {
        self.iter().filter(|(_, node)| node.is_library())
    }

    /// The nodes `id` depends on, in declaration order.
    pub fn deps_of(&self, id: ModuleId) -> impl Iterator<Item = &ModuleNode> {
        self.nodes
            .get(id.index())
            .into_iter()
            .flat_map(|node| node.deps.iter())
            .filter_map(|dep| self.nodes.get(dep.index()))
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.deps.len()).sum()
    }

    /// Total code units over library nodes.
    #[must_use]
    pub fn library_code_units(&self) -> u64 {
        self.libraries()
            .map(|(_, node)| u64::from(node.code_units))
            .sum()
    }

    /// Node → dependency-set map, the input shape of the topological orderer.
    #[must_use]
    pub fn dependency_map(&self) -> BTreeMap<ModuleId, BTreeSet<ModuleId>> {
        self.iter()
            .map(|(id, node)| (id, node.deps.iter().copied().collect()))
            .collect()
    }

    /// Dependency relation by name, independent of node order.
    #[must_use]
    pub fn named_dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.nodes
            .iter()
            .map(|node| {
                let deps = node
                    .deps
                    .iter()
                    .map(|dep| self.nodes[dep.index()].name.clone())
                    .collect();
                (node.name.clone(), deps)
            })
            .collect()
    }

    /// `(origin, destination)` name pairs for every dependency edge.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.deps
                    .iter()
                    .map(move |dep| (node.name.as_str(), self.nodes[dep.index()].name.as_str()))
            })
            .collect()
    }

    /// Whether every node appears after all of its dependencies.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        self.nodes
            .iter()
            .enumerate()
            .all(|(idx, node)| node.deps.iter().all(|dep| dep.index() < idx))
    }

    /// Library ids in dependency-first order, each level sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`CyclicGraphError`] naming the modules of every cycle.
    pub fn topological_order(&self) -> Result<Vec<ModuleId>, CyclicGraphError> {
        // Library names are unique, so ordering by name keeps each level in
        // name order regardless of how the nodes were listed.
        let ids: HashMap<&str, ModuleId> = self
            .libraries()
            .map(|(id, node)| (node.name.as_str(), id))
            .collect();
        let map: BTreeMap<&str, BTreeSet<&str>> = self
            .libraries()
            .map(|(_, node)| {
                let deps = node
                    .deps
                    .iter()
                    .map(|dep| self.nodes[dep.index()].name.as_str())
                    .collect();
                (node.name.as_str(), deps)
            })
            .collect();

        Ok(toposort_flatten(&map)?
            .into_iter()
            .filter_map(|name| ids.get(name).copied())
            .collect())
    }

    /// Re-order the graph topologically: libraries in orderer order, app last.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cyclic`] if the library subgraph has a cycle.
    pub fn topologically_sorted(self) -> Result<Self, GraphError> {
        let mut order = self.topological_order()?;
        order.push(self.app);

        let remap: BTreeMap<ModuleId, ModuleId> = order
            .iter()
            .enumerate()
            .map(|(new_idx, old)| (*old, ModuleId(new_idx)))
            .collect();

        let mut slots: Vec<Option<ModuleNode>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(slots.len());
        for old in &order {
            let Some(mut node) = slots.get_mut(old.index()).and_then(Option::take) else {
                return Err(GraphError::Invalid(format!("module {old} ordered twice")));
            };
            node.deps = node.deps.iter().map(|dep| remap[dep]).collect();
            nodes.push(node);
        }

        let app = ModuleId(nodes.len() - 1);
        Self::new(nodes, app)
    }

    /// BLAKE3 hash over the sorted `(origin, destination)` edge set and the
    /// node names, for comparing graphs built from the same input.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut names: Vec<&str> = self.nodes.iter().map(|node| node.name.as_str()).collect();
        names.sort_unstable();
        let mut edges = self.edges();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(b"\x00");
        }
        hasher.update(b"\x01");
        for (origin, destination) in edges {
            hasher.update(origin.as_bytes());
            hasher.update(b"\x00");
            hasher.update(destination.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }
}
