pub mod anonymize;
pub mod generate;
pub mod graph;

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use mockapp_core::generate::seeded_rng;
use mockapp_core::{BuildGraphError, GenType, GraphConfig, ModuleGraph, build_graph};
use serde::Serialize;

use crate::config::Settings;

/// Topology options shared by `gen` and `graph`.
#[derive(Args, Debug, Clone, Default)]
pub struct GraphOptions {
    /// Topology to generate (or `dot` to import one).
    #[arg(short = 'g', long, value_enum)]
    pub gen_type: Option<GenType>,

    /// Seed for randomized topologies. Omit for a different graph each run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Library count for `flat` and `layered`.
    #[arg(long)]
    pub module_count: Option<usize>,

    /// Big module count for `bs_flat` and `bs_layered`.
    #[arg(long)]
    pub big_module_count: Option<usize>,

    /// Small module count for `bs_flat` and `bs_layered`.
    #[arg(long)]
    pub small_module_count: Option<usize>,

    /// Layer count for `layered`.
    #[arg(long)]
    pub app_layer_count: Option<usize>,

    /// Dependency dump to import with `-g dot`.
    #[arg(long)]
    pub dot_file: Option<PathBuf>,

    /// Name of the app target in the dump.
    #[arg(long)]
    pub dot_root: Option<String>,
}

/// Fully resolved graph inputs.
#[derive(Debug, Clone, Serialize)]
pub struct GraphRequest {
    pub gen_type: GenType,
    pub seed: Option<u64>,
    pub config: GraphConfig,
}

impl GraphOptions {
    /// Merge flags over `settings` over built-in defaults.
    pub fn resolve(&self, settings: &Settings) -> anyhow::Result<GraphRequest> {
        let Some(gen_type) = self.gen_type.or(settings.gen_type) else {
            bail!(
                "no topology selected: pass --gen-type ({}) or set gen_type in mockapp.toml",
                GenType::ALL.map(GenType::as_str).join("|")
            );
        };
        let defaults = GraphConfig::default();
        let config = GraphConfig {
            module_count: self
                .module_count
                .or(settings.module_count)
                .unwrap_or(defaults.module_count),
            big_module_count: self
                .big_module_count
                .or(settings.big_module_count)
                .unwrap_or(defaults.big_module_count),
            small_module_count: self
                .small_module_count
                .or(settings.small_module_count)
                .unwrap_or(defaults.small_module_count),
            app_layer_count: self
                .app_layer_count
                .or(settings.app_layer_count)
                .unwrap_or(defaults.app_layer_count),
            dot_file: self.dot_file.clone(),
            dot_root: self.dot_root.clone(),
        };
        Ok(GraphRequest {
            gen_type,
            seed: self.seed.or(settings.seed),
            config,
        })
    }
}

impl GraphRequest {
    pub fn build(&self) -> Result<ModuleGraph, BuildGraphError> {
        let mut rng = seeded_rng(self.seed);
        build_graph(self.gen_type, &self.config, &mut rng)
    }
}
