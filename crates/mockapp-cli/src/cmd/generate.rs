//! `mockapp gen`: build a module graph and write a mock app project.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use mockapp_core::import::write_edges;
use mockapp_core::{GenType, GraphConfig};
use mockapp_gen::{
    BuildFlavor, ClocCounter, CodeBudget, LocOverrides, PROJECT_INFO_FILE, PodfileOptions,
    ProjectGenerator, ProjectOptions,
};
use serde::Serialize;
use tracing::{info, warn};

use super::GraphOptions;
use crate::config::{Settings, resolve_settings};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `mockapp gen`.
#[derive(Args, Debug)]
pub struct GenArgs {
    /// Directory to write the project into. Replaced if it exists.
    #[arg(short = 'o', long = "output-directory")]
    pub output_directory: PathBuf,

    #[command(flatten)]
    pub graph: GraphOptions,

    /// Build system to generate declarations for.
    #[arg(long, value_enum)]
    pub flavor: Option<BuildFlavor>,

    /// Location of the generated modules relative to the build root, used
    /// in target labels.
    #[arg(long)]
    pub module_path: Option<String>,

    /// Enable whole-module optimization in every target.
    #[arg(long)]
    pub use_wmo: bool,

    /// Swift lines of code to distribute over the libraries.
    #[arg(long = "lines-of-code", visible_alias = "swift-lines-of-code")]
    pub swift_lines_of_code: Option<u64>,

    /// Objective-C lines of code to distribute over the libraries.
    #[arg(long)]
    pub objc_lines_of_code: Option<u64>,

    /// JSON mapping of module name to lines of code, replacing the budget.
    #[arg(long)]
    pub loc_file: Option<PathBuf>,

    /// `cloc` executable used to measure generated file sizes.
    #[arg(long)]
    pub cloc: Option<PathBuf>,

    /// Link pods dynamically (cocoapods flavor).
    #[arg(long)]
    pub dynamic_linking: bool,

    /// Let CocoaPods pick random project UUIDs (cocoapods flavor).
    #[arg(long)]
    pub nondeterministic_uuids: bool,

    /// Generate one Xcode project per pod (cocoapods flavor).
    #[arg(long)]
    pub multiple_pod_projects: bool,

    /// Print the dependency edge list to stderr before generating.
    #[arg(long)]
    pub print_graph: bool,
}

impl GenArgs {
    fn project_options(&self, settings: &Settings) -> ProjectOptions {
        let pods = settings.podfile;
        ProjectOptions {
            flavor: self.flavor.or(settings.flavor).unwrap_or_default(),
            use_wmo: self.use_wmo || settings.use_wmo.unwrap_or(false),
            module_path: self
                .module_path
                .clone()
                .or_else(|| settings.module_path.clone())
                .unwrap_or_default(),
            podfile: PodfileOptions {
                dynamic_linking: self.dynamic_linking || pods.dynamic_linking.unwrap_or(false),
                deterministic_uuids: !self.nondeterministic_uuids
                    && pods.deterministic_uuids.unwrap_or(true),
                multiple_pod_projects: self.multiple_pod_projects
                    || pods.multiple_pod_projects.unwrap_or(false),
            },
        }
    }

    fn budget(&self, settings: &Settings) -> CodeBudget {
        let defaults = CodeBudget::default();
        CodeBudget {
            swift_loc: self
                .swift_lines_of_code
                .or(settings.swift_lines_of_code)
                .unwrap_or(defaults.swift_loc),
            objc_loc: self
                .objc_lines_of_code
                .or(settings.objc_lines_of_code)
                .unwrap_or(defaults.objc_loc),
        }
    }
}

/// Contents of `project_info.json`.
#[derive(Debug, Serialize)]
pub struct ProjectInfo {
    pub generator_version: &'static str,
    pub flavor: BuildFlavor,
    pub gen_type: GenType,
    pub seed: Option<u64>,
    pub graph_config: GraphConfig,
    pub options: ProjectOptions,
    pub budget: CodeBudget,
    pub loc_file: Option<PathBuf>,
    pub swift_file_size: u64,
    pub objc_file_size: u64,
    pub module_count: usize,
    pub edge_count: usize,
    pub graph_hash: String,
    pub file_count: usize,
    pub total_loc: u64,
    pub generation_time_seconds: f64,
    pub generated_at: DateTime<Utc>,
}

/// Result payload for `mockapp gen`.
#[derive(Debug, Serialize)]
struct GenReport {
    output_directory: PathBuf,
    example_command: &'static str,
    #[serde(flatten)]
    info: ProjectInfo,
}

/// Execute `mockapp gen`.
pub fn run_gen(args: &GenArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let started = Instant::now();
    let settings = resolve_settings(project_root)?;
    let request = args.graph.resolve(&settings)?;

    let graph = request.build()?;
    if args.print_graph {
        let edges: Vec<(String, String)> = graph
            .edges()
            .into_iter()
            .map(|(origin, destination)| (origin.to_string(), destination.to_string()))
            .collect();
        write_edges(&edges, &mut io::stderr().lock())?;
    }

    let overrides = args
        .loc_file
        .as_deref()
        .map(LocOverrides::load)
        .transpose()?;

    let counter = ClocCounter::with_program(
        args.cloc
            .clone()
            .or_else(|| settings.cloc.clone())
            .unwrap_or_else(|| PathBuf::from("cloc")),
    );
    let options = args.project_options(&settings);
    let generator = ProjectGenerator::new(options.clone(), &counter);
    let budget = args.budget(&settings);
    let project = generator.generate(&graph, &budget, overrides.as_ref())?;

    let out_dir = &args.output_directory;
    clear_output_directory(out_dir, project_root)?;
    project
        .write_to(out_dir)
        .with_context(|| format!("Failed to write project to {}", out_dir.display()))?;

    if let Some(loc_file) = &args.loc_file {
        let name = loc_file.file_name().unwrap_or("loc.json".as_ref());
        std::fs::copy(loc_file, out_dir.join(name))
            .with_context(|| format!("Failed to copy {}", loc_file.display()))?;
    }

    let sizes = generator.file_sizes();
    let info = ProjectInfo {
        generator_version: env!("CARGO_PKG_VERSION"),
        flavor: options.flavor,
        gen_type: request.gen_type,
        seed: request.seed,
        graph_config: request.config.clone(),
        options,
        budget,
        loc_file: args.loc_file.clone(),
        swift_file_size: sizes.swift,
        objc_file_size: sizes.objc,
        module_count: graph.len(),
        edge_count: graph.edge_count(),
        graph_hash: graph.content_hash(),
        file_count: project.files.len(),
        total_loc: project.index.total_loc(),
        generation_time_seconds: started.elapsed().as_secs_f64(),
        generated_at: Utc::now(),
    };
    let info_path = out_dir.join(PROJECT_INFO_FILE);
    std::fs::write(&info_path, serde_json::to_string_pretty(&info)? + "\n")
        .with_context(|| format!("Failed to write {}", info_path.display()))?;

    info!(
        dir = %out_dir.display(),
        seconds = info.generation_time_seconds,
        "project generation finished"
    );

    let report = GenReport {
        output_directory: out_dir.clone(),
        example_command: generator.example_command(),
        info,
    };
    render_mode(output, &report, render_gen_text, render_gen_pretty)
}

/// Remove `dir` so stale files from earlier runs cannot leak into the new
/// project. Refuses to remove the working directory or one of its parents.
fn clear_output_directory(dir: &Path, project_root: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if !dir.is_dir() {
        bail!("output path {} exists and is not a directory", dir.display());
    }
    let target = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;
    let cwd = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    if cwd.starts_with(&target) {
        bail!(
            "refusing to delete {}: it contains the working directory",
            target.display()
        );
    }
    warn!(dir = %target.display(), "deleting existing output directory");
    std::fs::remove_dir_all(&target)
        .with_context(|| format!("Failed to delete {}", target.display()))
}

fn render_gen_text(report: &GenReport, w: &mut dyn Write) -> io::Result<()> {
    let info = &report.info;
    writeln!(w, "output {}", report.output_directory.display())?;
    writeln!(w, "flavor {}", info.flavor.as_str())?;
    writeln!(w, "gen_type {}", info.gen_type)?;
    writeln!(w, "modules {}", info.module_count)?;
    writeln!(w, "files {}", info.file_count)?;
    writeln!(w, "loc {}", info.total_loc)?;
    writeln!(w, "seconds {:.3}", info.generation_time_seconds)?;
    writeln!(w, "next {}", report.example_command)
}

fn render_gen_pretty(report: &GenReport, w: &mut dyn Write) -> io::Result<()> {
    let info = &report.info;
    pretty_section(w, "Generated project")?;
    pretty_kv(w, "Output", report.output_directory.display().to_string())?;
    pretty_kv(w, "Flavor", info.flavor.as_str())?;
    pretty_kv(w, "Topology", info.gen_type.as_str())?;
    pretty_kv(w, "Modules", info.module_count.to_string())?;
    pretty_kv(w, "Edges", info.edge_count.to_string())?;
    pretty_kv(w, "Files", info.file_count.to_string())?;
    pretty_kv(w, "Lines", info.total_loc.to_string())?;
    pretty_kv(
        w,
        "File size",
        format!("swift {} / objc {}", info.swift_file_size, info.objc_file_size),
    )?;
    pretty_kv(w, "Took", format!("{:.3}s", info.generation_time_seconds))?;
    writeln!(w)?;
    writeln!(w, "Next: {}", report.example_command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_refuses_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = clear_output_directory(dir.path(), dir.path()).expect_err("refuse");
        assert!(err.to_string().contains("refusing to delete"));
        assert!(dir.path().exists());
    }

    #[test]
    fn clearing_removes_stale_output() {
        let root = tempfile::tempdir().expect("tempdir");
        let out = root.path().join("out");
        std::fs::create_dir_all(out.join("Stale")).expect("mkdir");
        clear_output_directory(&out, &root.path().join("elsewhere")).expect("clear");
        assert!(!out.exists());
        clear_output_directory(&out, root.path()).expect("missing is fine");
    }

    #[test]
    fn flags_and_settings_merge_into_options() {
        let args = GenArgs {
            output_directory: PathBuf::from("out"),
            graph: GraphOptions::default(),
            flavor: None,
            module_path: None,
            use_wmo: false,
            swift_lines_of_code: Some(10),
            objc_lines_of_code: None,
            loc_file: None,
            cloc: None,
            dynamic_linking: false,
            nondeterministic_uuids: true,
            multiple_pod_projects: false,
            print_graph: false,
        };
        let settings = Settings {
            flavor: Some(BuildFlavor::Bazel),
            use_wmo: Some(true),
            module_path: Some("mock".into()),
            objc_lines_of_code: Some(5),
            ..Settings::default()
        };
        let options = args.project_options(&settings);
        assert_eq!(options.flavor, BuildFlavor::Bazel);
        assert!(options.use_wmo);
        assert_eq!(options.module_path, "mock");
        assert!(!options.podfile.deterministic_uuids);
        assert_eq!(
            args.budget(&settings),
            CodeBudget {
                swift_loc: 10,
                objc_loc: 5
            }
        );
    }
}
