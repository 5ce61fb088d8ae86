//! `mockapp anonymize`: strip real target names from a dependency dump so
//! it can be shared.
//!
//! The root becomes `ImportedMainModule` and every other module
//! `ImportedLib<n>` in order of first appearance. The output is a dot file
//! that `mockapp gen -g dot --dot-root ImportedMainModule` accepts.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use mockapp_core::GraphError;
use mockapp_core::import::{ANONYMOUS_ROOT_NAME, DotImporter, Edge, anonymize_edges, write_edges};
use serde::Serialize;
use tracing::info;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `mockapp anonymize`.
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Dependency dump to read.
    pub input: PathBuf,

    /// Name of the app target in the dump.
    #[arg(long)]
    pub root: String,

    /// Where to write the anonymized dump. Prints to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnonymizeReport {
    input: PathBuf,
    output: PathBuf,
    root: &'static str,
    module_count: usize,
    edge_count: usize,
}

/// Render `edges` as a complete dot graph.
fn render_dot(edges: &[Edge], w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "digraph anonymized {{")?;
    write_edges(edges, w)?;
    writeln!(w, "}}")
}

fn anonymized_edges(text: &str, root: &str) -> Result<Vec<Edge>, GraphError> {
    let edges = DotImporter::new().clean_edges(text)?;
    let mut anonymized = anonymize_edges(&edges, root);
    anonymized.dedup();
    Ok(anonymized)
}

/// Execute `mockapp anonymize`.
pub fn run_anonymize(args: &AnonymizeArgs, output: OutputMode) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let edges = anonymized_edges(&text, &args.root)
        .with_context(|| format!("Failed to anonymize {}", args.input.display()))?;

    let Some(path) = &args.output else {
        // The dump itself is the output; a report would corrupt it.
        return render_dot(&edges, &mut io::stdout().lock()).map_err(Into::into);
    };

    let mut buf = Vec::new();
    render_dot(&edges, &mut buf)?;
    std::fs::write(path, buf).with_context(|| format!("Failed to write {}", path.display()))?;

    let mut modules: Vec<&str> = edges
        .iter()
        .flat_map(|(origin, destination)| [origin.as_str(), destination.as_str()])
        .collect();
    modules.sort_unstable();
    modules.dedup();
    info!(output = %path.display(), edges = edges.len(), "wrote anonymized dump");

    let report = AnonymizeReport {
        input: args.input.clone(),
        output: path.clone(),
        root: ANONYMOUS_ROOT_NAME,
        module_count: modules.len(),
        edge_count: edges.len(),
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{} {} {}", r.output.display(), r.module_count, r.edge_count),
        |r, w| {
            pretty_section(w, "Anonymized dump")?;
            pretty_kv(w, "Written to", r.output.display().to_string())?;
            pretty_kv(w, "Root", r.root)?;
            pretty_kv(w, "Modules", r.module_count.to_string())?;
            pretty_kv(w, "Edges", r.edge_count.to_string())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapp_core::import::ANONYMOUS_LIB_PREFIX;

    const DUMP: &str = r#"digraph g {
  "//apps:Rider" -> "//libs:Map";
  "//apps:Rider" -> "//libs:MapTests";
  "//libs:Map" -> "//libs:Net";
}"#;

    #[test]
    fn names_are_replaced_in_first_seen_order() {
        let edges = anonymized_edges(DUMP, "Rider").expect("edges");
        assert_eq!(
            edges,
            vec![
                (ANONYMOUS_ROOT_NAME.to_string(), format!("{ANONYMOUS_LIB_PREFIX}0")),
                (format!("{ANONYMOUS_LIB_PREFIX}0"), format!("{ANONYMOUS_LIB_PREFIX}1")),
            ]
        );
    }

    #[test]
    fn output_reimports() {
        let edges = anonymized_edges(DUMP, "Rider").expect("edges");
        let mut buf = Vec::new();
        render_dot(&edges, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let graph = DotImporter::new()
            .import_str(&text, ANONYMOUS_ROOT_NAME)
            .expect("reimport");
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn shared_leaf_names_are_not_merged() {
        let dump = "\"//a:x\" -> \"//a:y\";\n\"//b:x\" -> \"//b:z\";\n";
        let err = anonymized_edges(dump, "x").expect_err("ambiguous");
        assert_eq!(err, GraphError::AmbiguousNames(vec!["x".to_string()]));
    }
}
