//! Settings files.
//!
//! `mockapp.toml` in the working directory overrides the user file at
//! `<config_dir>/mockapp/config.toml`; command-line flags override both.
//! Every key is optional:
//!
//! ```toml
//! gen_type = "bs_layered"
//! flavor = "bazel"
//! seed = 42
//! swift_lines_of_code = 500000
//!
//! [podfile]
//! dynamic_linking = true
//! ```

use anyhow::{Context, Result};
use mockapp_core::GenType;
use mockapp_gen::BuildFlavor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project settings file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "mockapp.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub gen_type: Option<GenType>,
    pub flavor: Option<BuildFlavor>,
    pub module_path: Option<String>,
    pub use_wmo: Option<bool>,
    pub seed: Option<u64>,
    pub module_count: Option<usize>,
    pub big_module_count: Option<usize>,
    pub small_module_count: Option<usize>,
    pub app_layer_count: Option<usize>,
    pub swift_lines_of_code: Option<u64>,
    pub objc_lines_of_code: Option<u64>,
    /// `cloc` executable.
    pub cloc: Option<PathBuf>,
    pub podfile: PodfileSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PodfileSettings {
    pub dynamic_linking: Option<bool>,
    pub deterministic_uuids: Option<bool>,
    pub multiple_pod_projects: Option<bool>,
}

impl PodfileSettings {
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            dynamic_linking: over.dynamic_linking.or(self.dynamic_linking),
            deterministic_uuids: over.deterministic_uuids.or(self.deterministic_uuids),
            multiple_pod_projects: over.multiple_pod_projects.or(self.multiple_pod_projects),
        }
    }
}

impl Settings {
    /// Keys set in `over` replace those in `self`.
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            gen_type: over.gen_type.or(self.gen_type),
            flavor: over.flavor.or(self.flavor),
            module_path: over.module_path.or(self.module_path),
            use_wmo: over.use_wmo.or(self.use_wmo),
            seed: over.seed.or(self.seed),
            module_count: over.module_count.or(self.module_count),
            big_module_count: over.big_module_count.or(self.big_module_count),
            small_module_count: over.small_module_count.or(self.small_module_count),
            app_layer_count: over.app_layer_count.or(self.app_layer_count),
            swift_lines_of_code: over.swift_lines_of_code.or(self.swift_lines_of_code),
            objc_lines_of_code: over.objc_lines_of_code.or(self.objc_lines_of_code),
            cloc: over.cloc.or(self.cloc),
            podfile: self.podfile.overlay(over.podfile),
        }
    }
}

/// Parse one settings file. A missing file yields empty settings.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mockapp/config.toml"))
}

/// User settings overlaid with the project's `mockapp.toml`.
pub fn resolve_settings(project_root: &Path) -> Result<Settings> {
    let user = match user_config_path() {
        Some(path) => load_settings_file(&path)?,
        None => Settings::default(),
    };
    let project = load_settings_file(&project_root.join(PROJECT_CONFIG_FILE))?;
    Ok(user.overlay(project))
}
