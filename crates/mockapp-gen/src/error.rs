use std::path::PathBuf;

use mockapp_core::ErrorCode;

use crate::language::{FuncType, Language};

/// Code volume could not be distributed over the graph's libraries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// The graph has no library code units to share the budget between.
    #[error("graph has no library code units to allocate lines to")]
    ZeroCodeUnits,

    /// Both language budgets are zero.
    #[error("lines-of-code budget is zero")]
    EmptyBudget,

    /// A LOC mapping was supplied but has no entry for this library.
    #[error("LOC mapping has no entry for module {module:?}")]
    MissingOverride { module: String },

    /// The module's share of the budget rounds down to zero lines.
    #[error(
        "lines-of-code budget too small: module {module:?} would get no lines, increase the budget"
    )]
    BudgetTooSmall { module: String },
}

impl AllocationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ZeroCodeUnits => ErrorCode::ZeroCodeUnits,
            Self::EmptyBudget => ErrorCode::EmptyBudget,
            Self::MissingOverride { .. } => ErrorCode::MissingLocOverride,
            Self::BudgetTooSmall { .. } => ErrorCode::BudgetTooSmall,
        }
    }
}

/// A requested call site cannot be expressed in the caller's language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileGenError {
    #[error("{caller} code cannot call {func_type:?} functions of {callee} classes")]
    UnsupportedCall {
        caller: Language,
        callee: Language,
        func_type: FuncType,
    },
}

impl FileGenError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedCall { .. } => ErrorCode::UnsupportedCall,
        }
    }
}

/// The LOC mapping file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LocFileError {
    #[error("failed to read LOC file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse LOC file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LocFileError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::LocFileInvalid,
        }
    }
}

/// Anything that can abort project emission.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    FileGen(#[from] FileGenError),

    /// Emission reached a module whose dependency has not been generated,
    /// which means the graph was not in topological order.
    #[error("module {module:?} was generated before its dependency {dependency:?}")]
    OutOfOrder { module: String, dependency: String },

    /// A library would be written over the app directory or a root file.
    #[error("module name {module:?} is reserved for a generated project path")]
    ReservedName { module: String },

    #[error("failed to encode module index")]
    Index(#[from] serde_json::Error),
}

impl GenerateError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Allocation(err) => err.code(),
            Self::FileGen(err) => err.code(),
            Self::ReservedName { .. } => ErrorCode::ReservedModuleName,
            Self::OutOfOrder { .. } | Self::Index(_) => ErrorCode::InternalUnexpected,
        }
    }
}
