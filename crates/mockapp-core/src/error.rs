use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes shared by the library crates and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidGenerationArgs,
    IncompleteImportArgs,
    ConfigParseError,
    DotFileUnreadable,
    LocFileInvalid,
    AmbiguousModuleName,
    UnresolvedRoot,
    CycleDetected,
    InvalidGraph,
    ReservedModuleName,
    ZeroCodeUnits,
    EmptyBudget,
    BudgetTooSmall,
    MissingLocOverride,
    UnsupportedCall,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidGenerationArgs => "E1001",
            Self::IncompleteImportArgs => "E1002",
            Self::ConfigParseError => "E1003",
            Self::DotFileUnreadable => "E1004",
            Self::LocFileInvalid => "E1005",
            Self::AmbiguousModuleName => "E2001",
            Self::UnresolvedRoot => "E2002",
            Self::CycleDetected => "E2003",
            Self::InvalidGraph => "E2004",
            Self::ReservedModuleName => "E2005",
            Self::ZeroCodeUnits => "E3001",
            Self::EmptyBudget => "E3002",
            Self::BudgetTooSmall => "E3003",
            Self::MissingLocOverride => "E3004",
            Self::UnsupportedCall => "E3005",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidGenerationArgs => "Invalid graph generation arguments",
            Self::IncompleteImportArgs => "Incomplete dot import arguments",
            Self::ConfigParseError => "Config file parse error",
            Self::DotFileUnreadable => "Dot file could not be read",
            Self::LocFileInvalid => "LOC mapping file could not be loaded",
            Self::AmbiguousModuleName => "Ambiguous module name in imported graph",
            Self::UnresolvedRoot => "Root module not found in imported graph",
            Self::CycleDetected => "Dependency cycle detected",
            Self::InvalidGraph => "Malformed module graph",
            Self::ReservedModuleName => "Module name collides with a project path",
            Self::ZeroCodeUnits => "Graph has no library code units",
            Self::EmptyBudget => "Lines-of-code budget is zero",
            Self::BudgetTooSmall => "Lines-of-code budget too small",
            Self::MissingLocOverride => "Module missing from LOC file",
            Self::UnsupportedCall => "Unsupported cross-language call",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidGenerationArgs => {
                Some("Check --gen-type and the counts it needs (e.g. --app-layer-count > 0).")
            }
            Self::IncompleteImportArgs => {
                Some("Pass both --dot-file and --dot-root, or neither.")
            }
            Self::ConfigParseError => Some("Fix syntax in mockapp.toml and retry."),
            Self::DotFileUnreadable => Some("Check that --dot-file points at a readable file."),
            Self::LocFileInvalid => Some(
                "The LOC file must be a JSON object of module name to a line count or {\"loc\", \"language\"}.",
            ),
            Self::AmbiguousModuleName => {
                Some("Rename one of the targets or filter it out of the dependency dump.")
            }
            Self::UnresolvedRoot => Some("Use the leaf name of the app target, e.g. `App`."),
            Self::CycleDetected => Some("Remove dependency edges so the graph is acyclic."),
            Self::InvalidGraph => None,
            Self::ReservedModuleName => {
                Some("Rename the module or filter it out of the dependency dump.")
            }
            Self::ZeroCodeUnits => Some("Generate at least one library module."),
            Self::EmptyBudget => Some("Set --lines-of-code and/or --objc-lines-of-code above zero."),
            Self::BudgetTooSmall => {
                Some("Increase the lines-of-code budget so every module gets at least one file.")
            }
            Self::MissingLocOverride => {
                Some("Add an entry for every library module to the LOC mapping file.")
            }
            Self::UnsupportedCall => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Invalid combination of generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Layered generation needs at least one layer.
    #[error("layered generation requires app_layer_count > 0")]
    ZeroLayers,

    /// Only one half of the dot import pair was supplied.
    #[error(
        "dot import needs both a file path and a root node name (path: {path:?}, root: {root:?})"
    )]
    IncompleteDotArgs { path: String, root: String },

    /// `dot` generation was requested but no graph text was provided.
    #[error("dot generation requested without a dot file")]
    MissingDotInput,
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ZeroLayers => ErrorCode::InvalidGenerationArgs,
            Self::IncompleteDotArgs { .. } | Self::MissingDotInput => {
                ErrorCode::IncompleteImportArgs
            }
        }
    }
}

/// The input graph contains at least one dependency cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency graph contains cycles: {}", format_cycles(.cycles))]
pub struct CyclicGraphError {
    /// Members of each cycle (one strongly connected component per entry),
    /// sorted for deterministic reporting.
    pub cycles: Vec<Vec<String>>,
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|members| format!("[{}]", members.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Graph integrity failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Distinct qualified target names reduced to the same leaf name.
    #[error("ambiguous module names in dependency dump: {}", .0.join(", "))]
    AmbiguousNames(Vec<String>),

    /// The caller-supplied root name is not part of the parsed graph.
    #[error("root node {0:?} not found in dependency graph")]
    UnresolvedRoot(String),

    #[error(transparent)]
    Cyclic(#[from] CyclicGraphError),

    /// Graph construction received a structurally invalid node set.
    #[error("invalid module graph: {0}")]
    Invalid(String),
}

impl GraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AmbiguousNames(_) => ErrorCode::AmbiguousModuleName,
            Self::UnresolvedRoot(_) => ErrorCode::UnresolvedRoot,
            Self::Cyclic(_) => ErrorCode::CycleDetected,
            Self::Invalid(_) => ErrorCode::InvalidGraph,
        }
    }
}

/// Anything that can go wrong while producing a module graph.
#[derive(Debug, thiserror::Error)]
pub enum BuildGraphError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to read dot file {}", path.display())]
    ReadDot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildGraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(err) => err.code(),
            Self::Graph(err) => err.code(),
            Self::ReadDot { .. } => ErrorCode::DotFileUnreadable,
        }
    }
}
