//! Deterministic topological ordering of dependency maps.
//!
//! # Shape
//!
//! The input maps every node to the set of nodes it depends on. Nodes that
//! only appear as dependencies are treated as nodes with no dependencies of
//! their own. The output lists every node exactly once, dependencies first.
//!
//! # Determinism
//!
//! Nodes are emitted level by level (Kahn's algorithm): first every node with
//! no dependencies, then every node whose dependencies were all emitted in an
//! earlier level, and so on. Each level is emitted in ascending `Ord` order,
//! so identical input always produces identical output.
//!
//! # Cycles
//!
//! A self-dependency or any longer cycle makes the ordering fail with a
//! [`CyclicGraphError`] naming the members of every cyclic strongly
//! connected component.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::CyclicGraphError;

/// Flatten `graph` into a dependency-first sequence.
///
/// # Errors
///
/// Returns [`CyclicGraphError`] if `graph` contains a cycle.
pub fn toposort_flatten<K>(graph: &BTreeMap<K, BTreeSet<K>>) -> Result<Vec<K>, CyclicGraphError>
where
    K: Ord + Clone + Display,
{
    toposort_flatten_by(graph, ToString::to_string)
}

/// Like [`toposort_flatten`], but cycle members are reported through `label`.
///
/// # Errors
///
/// Returns [`CyclicGraphError`] if `graph` contains a cycle.
pub fn toposort_flatten_by<K, F>(
    graph: &BTreeMap<K, BTreeSet<K>>,
    label: F,
) -> Result<Vec<K>, CyclicGraphError>
where
    K: Ord + Clone,
    F: Fn(&K) -> String,
{
    let mut pending: BTreeMap<&K, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&K, Vec<&K>> = BTreeMap::new();

    for (node, deps) in graph {
        pending.insert(node, deps.len());
        for dep in deps {
            pending.entry(dep).or_insert(0);
            dependents.entry(dep).or_default().push(node);
        }
    }

    let mut order: Vec<K> = Vec::with_capacity(pending.len());
    let mut level: BTreeSet<&K> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();

    while !level.is_empty() {
        let mut next = BTreeSet::new();
        for node in level {
            order.push(node.clone());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.insert(*dependent);
                    }
                }
            }
        }
        level = next;
    }

    if order.len() == pending.len() {
        return Ok(order);
    }

    let emitted: BTreeSet<&K> = order.iter().collect();
    let stuck: BTreeMap<&K, &BTreeSet<K>> = graph
        .iter()
        .filter(|(node, _)| !emitted.contains(node))
        .collect();
    Err(CyclicGraphError {
        cycles: cyclic_components(&stuck, &label),
    })
}

/// Find the cyclic strongly connected components among the nodes that could
/// not be ordered.
fn cyclic_components<K, F>(stuck: &BTreeMap<&K, &BTreeSet<K>>, label: &F) -> Vec<Vec<String>>
where
    K: Ord,
    F: Fn(&K) -> String,
{
    let mut graph = DiGraph::<&K, ()>::new();
    let mut index: BTreeMap<&K, NodeIndex> = BTreeMap::new();

    for node in stuck.keys() {
        index.insert(*node, graph.add_node(*node));
    }
    for (node, deps) in stuck {
        for dep in *deps {
            if let (Some(&from), Some(&to)) = (index.get(node), index.get(dep)) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|idx| graph.find_edge(*idx, *idx).is_some())
        })
        .map(|component| {
            let mut members: Vec<String> =
                component.into_iter().map(|idx| label(graph[idx])).collect();
            members.sort_unstable();
            members
        })
        .collect();

    cycles.sort_unstable();
    cycles
}
