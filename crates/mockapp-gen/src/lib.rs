//! Source and build-file emission for mockapp.
//!
//! Given a [`mockapp_core::ModuleGraph`], this crate decides how many lines
//! of which language each library gets ([`allocate`]), renders Swift and
//! Objective-C sources that call into their dependencies ([`filegen`]) and
//! wraps everything in Buck, Bazel or CocoaPods declarations
//! ([`ProjectGenerator`]).
//!
//! # Conventions
//!
//! - **Errors**: each error enum exposes `code()` returning a
//!   [`mockapp_core::ErrorCode`].
//! - **Logging**: `tracing` spans on allocation and emission; per-module
//!   detail at `debug`.
//! - **Output**: generation is in-memory; [`GeneratedProject::write_to`]
//!   is the only function that touches the filesystem besides `cloc`
//!   sampling in [`loc`].

pub mod allocate;
pub mod buildfiles;
pub mod error;
pub mod filegen;
pub mod language;
pub mod loc;
pub mod locfile;
pub mod project;

pub use allocate::{CodeBudget, ModuleAllocation};
pub use buildfiles::{BuildFlavor, PodfileOptions};
pub use error::{AllocationError, FileGenError, GenerateError, LocFileError};
pub use language::{FuncType, Language};
pub use loc::{ClocCounter, FileSizes, LineCounter, RatioCounter};
pub use locfile::{LocEntry, LocOverrides};
pub use project::{
    GeneratedProject, ModuleIndex, PROJECT_INFO_FILE, ProjectGenerator, ProjectOptions,
};
