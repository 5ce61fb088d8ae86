//! mockapp-core library.
//!
//! Module dependency graphs for synthetic app generation: the graph model,
//! topology generators, the dot dependency-dump importer and the
//! deterministic topological orderer the emitter relies on.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern, each mapping to an
//!   [`error::ErrorCode`].
//! - **Logging**: `tracing` macros; graph builders are `#[instrument]`ed.
//! - **Determinism**: every randomized builder takes an injected RNG.

pub mod config;
pub mod error;
pub mod generate;
pub mod ids;
pub mod import;
pub mod model;
pub mod topo;

pub use config::{GenType, GraphConfig, build_graph};
pub use error::{BuildGraphError, ConfigError, CyclicGraphError, ErrorCode, GraphError};
pub use ids::IdGenerator;
pub use model::{ModuleGraph, ModuleId, ModuleKind, ModuleNode};
