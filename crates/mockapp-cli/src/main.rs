#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;

use clap::{Parser, Subcommand};
use mockapp_core::{BuildGraphError, ConfigError, ErrorCode, GraphError};
use mockapp_gen::{AllocationError, GenerateError, LocFileError};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "mockapp: synthetic multi-module app generator for build benchmarks",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (overridden by MOCKAPP_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        name = "gen",
        about = "Generate a mock app project",
        long_about = "Build a module graph, distribute the lines-of-code budget over it and \
                      write sources plus build files for the chosen build system.",
        after_help = "EXAMPLES:\n    # 10 layers of 10 modules, Buck\n    mockapp gen -o /tmp/mock -g layered --module-count 100 --app-layer-count 10\n\n    # Reproduce a real app's shape with Bazel\n    mockapp gen -o /tmp/mock -g dot --dot-file deps.dot --dot-root App --flavor bazel\n\n    # Mixed-language CocoaPods project\n    mockapp gen -o /tmp/mock -g bs_layered --flavor cocoapods --lines-of-code 300000 --objc-lines-of-code 100000"
    )]
    Gen(cmd::generate::GenArgs),

    #[command(
        about = "Print a module graph",
        long_about = "Build a module graph and print its edge list and statistics without generating code.",
        after_help = "EXAMPLES:\n    # Edge list of a seeded layered graph\n    mockapp graph -g layered --seed 7 --format text\n\n    # Stats and reverse dependencies as JSON\n    mockapp graph -g bs_flat --incoming --json"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        about = "Anonymize a dependency dump",
        long_about = "Replace every target name in a dot dependency dump with a neutral one so it can be shared.",
        after_help = "EXAMPLES:\n    # Write an anonymized copy\n    mockapp anonymize deps.dot --root App -o anon.dot"
    )]
    Anonymize(cmd::anonymize::AnonymizeArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MOCKAPP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "mockapp=debug,info"
        } else {
            "mockapp=info,warn"
        })
    });

    let format = env::var("MOCKAPP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// The stable code of the first library error in `err`'s chain.
fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<BuildGraphError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GenerateError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<LocFileError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<AllocationError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GraphError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.code())
        } else if cause.is::<toml::de::Error>() {
            Some(ErrorCode::ConfigParseError)
        } else {
            None
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = resolve_output_mode(cli.format, cli.json);
    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|project_root| {
            debug!(root = %project_root.display(), "resolved working directory");
            match &cli.command {
                Commands::Gen(args) => cmd::generate::run_gen(args, output, &project_root),
                Commands::Graph(args) => cmd::graph::run_graph(args, output, &project_root),
                Commands::Anonymize(args) => cmd::anonymize::run_anonymize(args, output),
            }
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut cli_error = CliError::new(format!("{err:#}"));
            if let Some(code) = error_code(&err) {
                cli_error = cli_error.with_code(code);
            }
            if render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
