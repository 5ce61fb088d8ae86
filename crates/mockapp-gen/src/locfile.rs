//! Per-module line counts read from a JSON mapping.
//!
//! ```json
//! { "Networking": 1200, "Legacy": { "loc": 300, "language": "objc" } }
//! ```
//!
//! A bare number means a Swift module of that size.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LocFileError;
use crate::language::Language;

/// One module's entry in a LOC mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocEntry {
    Lines(u64),
    Detailed {
        loc: u64,
        #[serde(default)]
        language: Language,
    },
}

impl LocEntry {
    #[must_use]
    pub const fn loc(self) -> u64 {
        match self {
            Self::Lines(loc) | Self::Detailed { loc, .. } => loc,
        }
    }

    #[must_use]
    pub const fn language(self) -> Language {
        match self {
            Self::Lines(_) => Language::Swift,
            Self::Detailed { language, .. } => language,
        }
    }
}

/// Module name → measured size, replacing weight-based allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocOverrides(BTreeMap<String, LocEntry>);

impl LocOverrides {
    /// # Errors
    ///
    /// Returns the JSON error if `json` is not a mapping of module names to
    /// entries.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns [`LocFileError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LocFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| LocFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides = Self::from_json_str(&text).map_err(|source| LocFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), modules = overrides.len(), "loaded LOC mapping");
        Ok(overrides)
    }

    #[must_use]
    pub fn get(&self, module: &str) -> Option<LocEntry> {
        self.0.get(module).copied()
    }

    pub fn insert(&mut self, module: impl Into<String>, entry: LocEntry) {
        self.0.insert(module.into(), entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
