//! Graph generation parameters and topology dispatch.

use std::fmt;
use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{BuildGraphError, ConfigError};
use crate::generate::{self, DEFAULT_DEPS_PER_NODE};
use crate::import::DotImporter;
use crate::model::ModuleGraph;

/// Which graph topology to build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum GenType {
    /// Every library imported directly by the app.
    Flat,
    /// Big and small libraries imported directly by the app.
    #[value(name = "bs_flat")]
    BsFlat,
    /// Layers of libraries depending on lower layers.
    Layered,
    /// Big libraries over a small layered sub-graph.
    #[value(name = "bs_layered")]
    BsLayered,
    /// Imported from a dot dependency dump.
    Dot,
}

impl GenType {
    pub const ALL: [Self; 5] = [
        Self::Flat,
        Self::BsFlat,
        Self::Layered,
        Self::BsLayered,
        Self::Dot,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::BsFlat => "bs_flat",
            Self::Layered => "layered",
            Self::BsLayered => "bs_layered",
            Self::Dot => "dot",
        }
    }
}

impl fmt::Display for GenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts and inputs shared by every topology. Each [`GenType`] reads the
/// fields it needs and ignores the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_module_count")]
    pub module_count: usize,
    #[serde(default = "default_big_module_count")]
    pub big_module_count: usize,
    #[serde(default = "default_small_module_count")]
    pub small_module_count: usize,
    #[serde(default = "default_app_layer_count")]
    pub app_layer_count: usize,
    #[serde(default)]
    pub dot_file: Option<PathBuf>,
    #[serde(default)]
    pub dot_root: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            module_count: default_module_count(),
            big_module_count: default_big_module_count(),
            small_module_count: default_small_module_count(),
            app_layer_count: default_app_layer_count(),
            dot_file: None,
            dot_root: None,
        }
    }
}

const fn default_module_count() -> usize {
    100
}

const fn default_big_module_count() -> usize {
    3
}

const fn default_small_module_count() -> usize {
    50
}

const fn default_app_layer_count() -> usize {
    10
}

impl GraphConfig {
    /// Check that the dot inputs are supplied together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IncompleteDotArgs`] when only one is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.dot_file, &self.dot_root) {
            (Some(_), None) | (None, Some(_)) => {
                let path = self
                    .dot_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                let root = self.dot_root.clone().unwrap_or_default();
                debug!(%path, %root, "dot file and dot root must be given together");
                Err(ConfigError::IncompleteDotArgs { path, root })
            }
            _ => Ok(()),
        }
    }

    /// Libraries per layer for [`GenType::Layered`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroLayers`] if `app_layer_count` is 0.
    pub const fn modules_per_layer(&self) -> Result<usize, ConfigError> {
        if self.app_layer_count == 0 {
            return Err(ConfigError::ZeroLayers);
        }
        Ok(self.module_count / self.app_layer_count)
    }
}

/// Build the graph selected by `gen_type`.
///
/// # Errors
///
/// - [`ConfigError`] for invalid parameter combinations.
/// - [`BuildGraphError::ReadDot`] or a graph error when importing a dot file.
#[instrument(skip(config, rng))]
pub fn build_graph<R: Rng + ?Sized>(
    gen_type: GenType,
    config: &GraphConfig,
    rng: &mut R,
) -> Result<ModuleGraph, BuildGraphError> {
    config.validate()?;

    let graph = match gen_type {
        GenType::Flat => generate::flat(config.module_count)?,
        GenType::BsFlat => {
            generate::flat_big_small(config.big_module_count, config.small_module_count)?
        }
        GenType::Layered => generate::layered(
            config.app_layer_count,
            config.modules_per_layer()?,
            DEFAULT_DEPS_PER_NODE,
            rng,
        )?,
        GenType::BsLayered => generate::layered_big_small(
            config.big_module_count,
            config.small_module_count,
            rng,
        )?,
        GenType::Dot => {
            let (Some(path), Some(root)) = (&config.dot_file, &config.dot_root) else {
                return Err(ConfigError::MissingDotInput.into());
            };
            DotImporter::new().import_file(path, root)?
        }
    };

    info!(
        %gen_type,
        modules = graph.len(),
        edges = graph.edge_count(),
        "module graph built"
    );
    Ok(graph)
}
