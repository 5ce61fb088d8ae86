//! `mockapp graph`: build a module graph and report its shape without
//! generating any code.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use mockapp_core::import::{DepMap, incoming_edge_map, write_edges};
use mockapp_core::{GenType, ModuleGraph};
use serde::Serialize;

use super::GraphOptions;
use crate::config::resolve_settings;
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `mockapp graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub graph: GraphOptions,

    /// Also list, for every module, the modules that depend on it.
    #[arg(long)]
    pub incoming: bool,
}

/// Report payload for `mockapp graph`.
#[derive(Debug, Serialize)]
pub struct GraphReport {
    pub gen_type: GenType,
    pub seed: Option<u64>,
    pub app: String,
    pub module_count: usize,
    pub library_count: usize,
    pub edge_count: usize,
    pub code_units: u64,
    pub content_hash: String,
    /// Modules in generation order, app last.
    pub order: Vec<String>,
    pub edges: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<DepMap>,
}

impl GraphReport {
    fn new(gen_type: GenType, seed: Option<u64>, graph: &ModuleGraph, incoming: bool) -> Self {
        let edges: Vec<(String, String)> = graph
            .edges()
            .into_iter()
            .map(|(origin, destination)| (origin.to_string(), destination.to_string()))
            .collect();
        let incoming = incoming.then(|| {
            let outgoing: DepMap = graph
                .named_dependency_map()
                .into_iter()
                .map(|(name, deps)| (name, deps.into_iter().collect()))
                .collect();
            incoming_edge_map(&outgoing)
        });
        Self {
            gen_type,
            seed,
            app: graph.app().name.clone(),
            module_count: graph.len(),
            library_count: graph.libraries().count(),
            edge_count: graph.edge_count(),
            code_units: graph.library_code_units(),
            content_hash: graph.content_hash(),
            order: graph.nodes().iter().map(|n| n.name.clone()).collect(),
            edges,
            incoming,
        }
    }
}

/// Execute `mockapp graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let settings = resolve_settings(project_root)?;
    let request = args.graph.resolve(&settings)?;
    let graph = request.build()?;
    let report = GraphReport::new(request.gen_type, request.seed, &graph, args.incoming);
    render_mode(output, &report, render_graph_text, render_graph_pretty)
}

fn render_graph_text(report: &GraphReport, w: &mut dyn Write) -> io::Result<()> {
    write_edges(&report.edges, w)?;
    if let Some(incoming) = &report.incoming {
        write_incoming(incoming, w)?;
    }
    Ok(())
}

fn render_graph_pretty(report: &GraphReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Module graph")?;
    pretty_kv(w, "Topology", report.gen_type.as_str())?;
    if let Some(seed) = report.seed {
        pretty_kv(w, "Seed", seed.to_string())?;
    }
    pretty_kv(w, "App", &report.app)?;
    pretty_kv(w, "Libraries", report.library_count.to_string())?;
    pretty_kv(w, "Edges", report.edge_count.to_string())?;
    pretty_kv(w, "Code units", report.code_units.to_string())?;
    pretty_kv(w, "Hash", &report.content_hash)?;
    writeln!(w)?;

    pretty_section(w, "Dependencies")?;
    let mut by_origin: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (origin, destination) in &report.edges {
        by_origin.entry(origin).or_default().push(destination);
    }
    for name in &report.order {
        let deps = by_origin.get(name.as_str()).map_or_else(Vec::new, Clone::clone);
        writeln!(w, "{name:<24} -> {}", deps.join(", "))?;
    }

    if let Some(incoming) = &report.incoming {
        writeln!(w)?;
        pretty_section(w, "Depended on by")?;
        write_incoming(incoming, w)?;
    }
    pretty_rule(w)
}

fn write_incoming(incoming: &DepMap, w: &mut dyn Write) -> io::Result<()> {
    for (name, dependents) in incoming {
        writeln!(w, "{name} <- {}", dependents.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapp_core::generate::flat;

    #[test]
    fn report_counts_and_incoming() {
        let graph = flat(3).expect("graph");
        let report = GraphReport::new(GenType::Flat, None, &graph, true);
        assert_eq!(report.module_count, 4);
        assert_eq!(report.library_count, 3);
        assert_eq!(report.edge_count, 3);
        assert_eq!(report.order.last().map(String::as_str), Some("App"));
        let incoming = report.incoming.expect("incoming");
        assert_eq!(incoming["MockLib0"], vec!["App".to_string()]);
        assert!(incoming["App"].is_empty());
    }

    #[test]
    fn text_output_is_an_edge_list() {
        let graph = flat(2).expect("graph");
        let report = GraphReport::new(GenType::Flat, None, &graph, false);
        let mut buf = Vec::new();
        render_graph_text(&report, &mut buf).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "\"App\" -> \"MockLib0\";\n\"App\" -> \"MockLib1\";\n"
        );
    }
}
