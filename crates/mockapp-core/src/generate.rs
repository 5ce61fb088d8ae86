//! Synthetic module graph topologies.
//!
//! Every generator returns a [`ModuleGraph`] whose node list is already in
//! topological order with the app node last. Randomized generators take an
//! injected [`Rng`] so a fixed seed reproduces the same graph.
//!
//! | Generator | Libraries | Edges |
//! |-----------|-----------|-------|
//! | [`flat`] | `MockLib{i}` | app → every library |
//! | [`flat_big_small`] | `BigMockLib{i}` (20 units), `SmallMockLib{i}` | app → every library |
//! | [`layered`] | `MockLib{layer}_{n}` | each node → sample of all lower layers, app → top layer |
//! | [`layered_big_small`] | `AppMockLib{i}` (20 units) over a 3-layer sub-graph | app → big libraries → sub-graph top layer |

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::model::{BIG_MODULE_CODE_UNITS, ModuleGraph, ModuleId, ModuleNode};

/// Name of the application node produced by every generator.
pub const APP_NAME: &str = "App";

/// Default number of dependencies drawn per node in [`layered`].
pub const DEFAULT_DEPS_PER_NODE: usize = 5;

/// Layer count of the sub-graph built by [`layered_big_small`].
const BIG_SMALL_LAYER_COUNT: usize = 3;

/// An RNG seeded from `seed`, or from OS entropy when `None`.
#[must_use]
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// `module_count` independent libraries, all imported by the app.
///
/// # Errors
///
/// Returns [`GraphError::Invalid`] only if graph validation fails, which the
/// generated shape never triggers.
#[instrument(level = "debug")]
pub fn flat(module_count: usize) -> Result<ModuleGraph, GraphError> {
    let mut nodes: Vec<ModuleNode> = (0..module_count)
        .map(|i| ModuleNode::library(format!("MockLib{i}")))
        .collect();
    nodes.push(ModuleNode::app(APP_NAME, (0..module_count).map(ModuleId).collect()));
    ModuleGraph::new(nodes, ModuleId(module_count))
}

/// `big` heavy libraries followed by `small` standard ones, all imported by
/// the app and otherwise unconnected.
///
/// # Errors
///
/// See [`flat`].
#[instrument(level = "debug")]
pub fn flat_big_small(big: usize, small: usize) -> Result<ModuleGraph, GraphError> {
    let total = big + small;
    let mut nodes: Vec<ModuleNode> = Vec::with_capacity(total + 1);
    nodes.extend((0..big).map(|i| {
        ModuleNode::library(format!("BigMockLib{i}")).with_code_units(BIG_MODULE_CODE_UNITS)
    }));
    nodes.extend((0..small).map(|i| ModuleNode::library(format!("SmallMockLib{i}"))));
    nodes.push(ModuleNode::app(APP_NAME, (0..total).map(ModuleId).collect()));
    ModuleGraph::new(nodes, ModuleId(total))
}

/// `layers` layers of `per_layer` libraries each.
///
/// Layer 0 is the top layer and is what the app imports. Every node in
/// layer `l` depends on `min(deps_per_node, |lower|)` nodes sampled without
/// replacement from all layers below it (`l + 1 ..`); the bottom layer has
/// no dependencies.
///
/// # Errors
///
/// See [`flat`].
#[instrument(level = "debug", skip(rng))]
pub fn layered<R: Rng + ?Sized>(
    layers: usize,
    per_layer: usize,
    deps_per_node: usize,
    rng: &mut R,
) -> Result<ModuleGraph, GraphError> {
    let layered = LayeredLibraries::build(layers, per_layer, deps_per_node, rng);
    let app_deps = layered.top_layer();
    let mut nodes = layered.nodes;
    let app = ModuleId(nodes.len());
    nodes.push(ModuleNode::app(APP_NAME, app_deps));

    let graph = ModuleGraph::new(nodes, app)?.topologically_sorted()?;
    debug!(nodes = graph.len(), edges = graph.edge_count(), "layered graph generated");
    Ok(graph)
}

/// `big` heavy `AppMockLib{i}` libraries layered over a 3-layer sub-graph
/// of `small / 3` libraries per layer.
///
/// The big libraries depend on the sub-graph's top layer and the app depends
/// on the big libraries only. Sub-graph nodes draw a single dependency each.
///
/// # Errors
///
/// See [`flat`].
#[instrument(level = "debug", skip(rng))]
pub fn layered_big_small<R: Rng + ?Sized>(
    big: usize,
    small: usize,
    rng: &mut R,
) -> Result<ModuleGraph, GraphError> {
    let per_layer = small / BIG_SMALL_LAYER_COUNT;
    let deps_per_node = (BIG_SMALL_LAYER_COUNT / 2).max(1);
    let layered = LayeredLibraries::build(BIG_SMALL_LAYER_COUNT, per_layer, deps_per_node, rng);
    let top = layered.top_layer();

    let mut nodes = layered.nodes;
    let first_big = nodes.len();
    nodes.extend((0..big).map(|i| {
        ModuleNode::library(format!("AppMockLib{i}"))
            .with_code_units(BIG_MODULE_CODE_UNITS)
            .with_deps(top.clone())
    }));
    let app = ModuleId(nodes.len());
    nodes.push(ModuleNode::app(
        APP_NAME,
        (first_big..first_big + big).map(ModuleId).collect(),
    ));

    let graph = ModuleGraph::new(nodes, app)?.topologically_sorted()?;
    debug!(nodes = graph.len(), edges = graph.edge_count(), "layered big/small graph generated");
    Ok(graph)
}

/// Library nodes of a layered graph before the app is attached.
struct LayeredLibraries {
    nodes: Vec<ModuleNode>,
    per_layer: usize,
}

impl LayeredLibraries {
    fn build<R: Rng + ?Sized>(
        layers: usize,
        per_layer: usize,
        deps_per_node: usize,
        rng: &mut R,
    ) -> Self {
        // Node (layer, n) lives at index layer * per_layer + n.
        let mut nodes = Vec::with_capacity(layers * per_layer);
        for layer in 0..layers {
            let lower: Vec<ModuleId> = ((layer + 1) * per_layer..layers * per_layer)
                .map(ModuleId)
                .collect();
            for n in 0..per_layer {
                let deps = if deps_per_node < lower.len() {
                    lower
                        .choose_multiple(rng, deps_per_node)
                        .copied()
                        .collect()
                } else {
                    lower.clone()
                };
                nodes.push(ModuleNode::library(format!("MockLib{layer}_{n}")).with_deps(deps));
            }
        }
        Self { nodes, per_layer }
    }

    fn top_layer(&self) -> Vec<ModuleId> {
        (0..self.per_layer.min(self.nodes.len()))
            .map(ModuleId)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleKind;

    #[test]
    fn flat_app_imports_everything() {
        let g = flat(4).expect("flat graph");
        assert_eq!(g.len(), 5);
        assert_eq!(g.app_id(), ModuleId(4));
        assert_eq!(g.app().deps.len(), 4);
        assert!(g.libraries().all(|(_, n)| n.deps.is_empty()));
        assert_eq!(g.nodes()[0].name, "MockLib0");
    }

    #[test]
    fn flat_zero_is_a_lonely_app() {
        let g = flat(0).expect("flat graph");
        assert_eq!(g.len(), 1);
        assert!(g.app().deps.is_empty());
    }

    #[test]
    fn big_small_weights() {
        let g = flat_big_small(2, 3).expect("graph");
        let units: Vec<u32> = g.libraries().map(|(_, n)| n.code_units).collect();
        assert_eq!(units, vec![20, 20, 1, 1, 1]);
        assert_eq!(g.nodes()[1].name, "BigMockLib1");
        assert_eq!(g.nodes()[2].name, "SmallMockLib0");
        assert_eq!(g.app().deps.len(), 5);
    }

    #[test]
    fn layered_shape() {
        let mut rng = seeded_rng(Some(7));
        let g = layered(4, 3, DEFAULT_DEPS_PER_NODE, &mut rng).expect("graph");
        assert_eq!(g.len(), 13);
        assert_eq!(g.app().kind, ModuleKind::App);
        assert!(g.is_topologically_ordered());

        let app_deps: Vec<&str> = g.deps_of(g.app_id()).map(|n| n.name.as_str()).collect();
        assert_eq!(app_deps.len(), 3);
        assert!(app_deps.iter().all(|name| name.starts_with("MockLib0_")));

        for (_, node) in g.libraries() {
            let layer: usize = node.name["MockLib".len()..]
                .split('_')
                .next()
                .and_then(|l| l.parse().ok())
                .expect("layer index in name");
            let lower_count = (4 - layer - 1) * 3;
            assert_eq!(node.deps.len(), DEFAULT_DEPS_PER_NODE.min(lower_count));
        }
    }

    #[test]
    fn layered_takes_all_lower_when_sample_is_large() {
        let mut rng = seeded_rng(Some(1));
        let g = layered(2, 2, 10, &mut rng).expect("graph");
        let top = g.find("MockLib0_0").expect("top node");
        let deps: Vec<&str> = g.deps_of(top).map(|n| n.name.as_str()).collect();
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn layered_big_small_counts() {
        let mut rng = seeded_rng(Some(3));
        let g = layered_big_small(10, 10, &mut rng).expect("graph");
        // 3 layers of 3, 10 big libraries, app.
        assert_eq!(g.len(), 20);
        assert!(g.is_topologically_ordered());
        assert_eq!(g.app().deps.len(), 10);
        for (_, node) in g.libraries() {
            if node.name.starts_with("AppMockLib") {
                assert_eq!(node.code_units, BIG_MODULE_CODE_UNITS);
                assert_eq!(node.deps.len(), 3);
            } else if node.name.starts_with("MockLib2_") {
                assert!(node.deps.is_empty());
            } else {
                assert_eq!(node.deps.len(), 1);
            }
        }
    }

    #[test]
    fn same_seed_same_graph() {
        let a = layered(5, 6, 3, &mut seeded_rng(Some(42))).expect("graph");
        let b = layered(5, 6, 3, &mut seeded_rng(Some(42))).expect("graph");
        assert_eq!(a, b);
    }
}
