use std::fmt;

use serde::{Deserialize, Serialize};

/// Source language of a generated module.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Swift,
    ObjC,
}

impl Language {
    /// Extension of implementation files, without the dot.
    #[must_use]
    pub const fn source_extension(self) -> &'static str {
        match self {
            Self::Swift => "swift",
            Self::ObjC => "m",
        }
    }

    /// Language key used in `cloc --json` output.
    #[must_use]
    pub const fn cloc_name(self) -> &'static str {
        match self {
            Self::Swift => "Swift",
            Self::ObjC => "Objective-C",
        }
    }

    /// Ratio of code lines to total lines in a sample generated file, used
    /// when `cloc` is unavailable.
    #[must_use]
    pub const fn fallback_code_ratio(self) -> f64 {
        match self {
            Self::Swift => 0.811_537_333,
            Self::ObjC => 0.772_727_272,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Swift => "swift",
            Self::ObjC => "objc",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a generated function can be called from Objective-C.
///
/// The declaration order is the order call sites are generated in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FuncType {
    /// Generic Swift function, invisible to Objective-C.
    SwiftOnly,
    /// Exposed to the Objective-C runtime.
    ObjcFriendly,
}

impl FuncType {
    /// Whether code written in `caller` can invoke a function of this type.
    #[must_use]
    pub const fn callable_from(self, caller: Language) -> bool {
        !matches!((self, caller), (Self::SwiftOnly, Language::ObjC))
    }
}
