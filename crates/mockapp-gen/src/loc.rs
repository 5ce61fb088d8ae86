//! Code-line measurement of generated files.
//!
//! The allocator needs to know how many lines of code one generated file is
//! worth in each language. That is measured once per run by generating a
//! sample file and counting it with `cloc`; when `cloc` is not installed the
//! total line count is scaled by a fixed per-language ratio instead.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use mockapp_core::IdGenerator;
use tracing::{debug, info, warn};

use crate::filegen::{
    CLASSES_PER_FILE, FUNCTIONS_PER_CLASS, ObjcSourceFileGenerator, SwiftFileGenerator,
};
use crate::language::Language;

/// Why a line count could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("could not run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write sample file")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with status {status}")]
    Failed { program: String, status: i32 },

    #[error("unexpected cloc output: {0}")]
    BadOutput(String),
}

/// Counts code lines (excluding blanks and comments) in source text.
pub trait LineCounter {
    /// # Errors
    ///
    /// Returns a [`LocError`] if the count cannot be produced.
    fn count_code_lines(&self, text: &str, language: Language) -> Result<u64, LocError>;
}

/// [`LineCounter`] backed by the `cloc` tool.
#[derive(Debug, Clone)]
pub struct ClocCounter {
    program: PathBuf,
}

impl Default for ClocCounter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("cloc"),
        }
    }
}

impl ClocCounter {
    /// Use `program` instead of `cloc` from `PATH`.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl LineCounter for ClocCounter {
    fn count_code_lines(&self, text: &str, language: Language) -> Result<u64, LocError> {
        let program = self.program.display().to_string();
        let mut sample = tempfile::Builder::new()
            .prefix("mockapp_sample_")
            .suffix(&format!(".{}", language.source_extension()))
            .tempfile()?;
        sample.write_all(text.as_bytes())?;
        sample.flush()?;

        info!(path = %sample.path().display(), "counting lines of code");
        let output = Command::new(&self.program)
            .args(["--quiet", "--json"])
            .arg(sample.path())
            .output()
            .map_err(|source| LocError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(LocError::Failed {
                program,
                status: output.status.code().unwrap_or(-1),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_cloc_json(&stdout, language)
    }
}

/// Extract `<language>.code` from `cloc --json` output.
///
/// # Errors
///
/// Returns [`LocError::BadOutput`] if the JSON is malformed or reports no
/// code lines for `language`.
pub fn parse_cloc_json(json: &str, language: Language) -> Result<u64, LocError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| LocError::BadOutput(err.to_string()))?;
    match value
        .get(language.cloc_name())
        .and_then(|entry| entry.get("code"))
        .and_then(serde_json::Value::as_u64)
    {
        Some(code) if code > 0 => Ok(code),
        _ => Err(LocError::BadOutput(json.trim().to_string())),
    }
}

/// [`LineCounter`] that applies [`Language::fallback_code_ratio`] to the
/// total line count.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioCounter;

impl LineCounter for RatioCounter {
    fn count_code_lines(&self, text: &str, language: Language) -> Result<u64, LocError> {
        Ok(fallback_code_lines(text.split('\n').count(), language))
    }
}

/// `ceil(lines * ratio)` for `language`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn fallback_code_lines(lines: usize, language: Language) -> u64 {
    (lines as f64 * language.fallback_code_ratio()).ceil() as u64
}

/// Code lines in one generated file, per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSizes {
    pub swift: u64,
    pub objc: u64,
}

impl FileSizes {
    #[must_use]
    pub const fn for_language(&self, language: Language) -> u64 {
        match language {
            Language::Swift => self.swift,
            Language::ObjC => self.objc,
        }
    }

    /// Measure a sample file per language with `counter`, falling back to
    /// [`RatioCounter`] (with a warning) if it fails.
    #[must_use]
    pub fn measure(counter: &dyn LineCounter) -> Self {
        Self {
            swift: measure_language(counter, Language::Swift),
            objc: measure_language(counter, Language::ObjC),
        }
    }
}

fn sample_text(language: Language) -> String {
    let mut ids = IdGenerator::new();
    match language {
        Language::Swift => {
            SwiftFileGenerator
                .gen_file(&mut ids, CLASSES_PER_FILE, FUNCTIONS_PER_CLASS, &[])
                .text
        }
        Language::ObjC => {
            ObjcSourceFileGenerator
                .gen_file(&mut ids, CLASSES_PER_FILE, FUNCTIONS_PER_CLASS, &[], None)
                .text
        }
    }
}

fn measure_language(counter: &dyn LineCounter, language: Language) -> u64 {
    let text = sample_text(language);
    let loc = match counter.count_code_lines(&text, language) {
        Ok(loc) => loc,
        Err(err) => {
            warn!(
                %language,
                error = %err,
                "using fallback lines-of-code ratio, install cloc for exact counts"
            );
            fallback_code_lines(text.split('\n').count(), language)
        }
    };
    // A zero size would make every file count a division by zero.
    let loc = loc.max(1);
    debug!(%language, loc, "measured generated file size");
    loc
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl LineCounter for Broken {
        fn count_code_lines(&self, _text: &str, _language: Language) -> Result<u64, LocError> {
            Err(LocError::BadOutput("nope".into()))
        }
    }

    struct Fixed(u64);

    impl LineCounter for Fixed {
        fn count_code_lines(&self, _text: &str, _language: Language) -> Result<u64, LocError> {
            Ok(self.0)
        }
    }

    #[test]
    fn fallback_ratios() {
        assert_eq!(fallback_code_lines(100, Language::Swift), 82);
        assert_eq!(fallback_code_lines(100, Language::ObjC), 78);
        assert_eq!(fallback_code_lines(0, Language::Swift), 0);
    }

    #[test]
    fn parses_cloc_output() {
        let json = r#"{"header": {"cloc_version": "1.90"}, "Swift": {"nFiles": 1, "blank": 10, "comment": 0, "code": 123}, "SUM": {"code": 123}}"#;
        assert_eq!(parse_cloc_json(json, Language::Swift).expect("count"), 123);
        assert!(parse_cloc_json(json, Language::ObjC).is_err());
        assert!(parse_cloc_json("not json", Language::Swift).is_err());
    }

    #[test]
    fn objc_uses_objective_c_key() {
        let json = r#"{"Objective-C": {"code": 40}}"#;
        assert_eq!(parse_cloc_json(json, Language::ObjC).expect("count"), 40);
    }

    #[test]
    fn failing_counter_falls_back() {
        let sizes = FileSizes::measure(&Broken);
        let swift_lines = sample_text(Language::Swift).split('\n').count();
        assert_eq!(sizes.swift, fallback_code_lines(swift_lines, Language::Swift));
        assert!(sizes.objc > 0);
    }

    #[test]
    fn counter_result_is_used() {
        let sizes = FileSizes::measure(&Fixed(42));
        assert_eq!(sizes, FileSizes { swift: 42, objc: 42 });
        assert_eq!(sizes.for_language(Language::ObjC), 42);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let counter = ClocCounter::with_program("/nonexistent/mockapp-cloc");
        let err = counter
            .count_code_lines("let x = 1\n", Language::Swift)
            .expect_err("no such program");
        assert!(matches!(err, LocError::Spawn { .. }));
    }

    #[test]
    fn ratio_counter_matches_fallback() {
        let text = "a\nb\nc";
        assert_eq!(
            RatioCounter.count_code_lines(text, Language::Swift).expect("count"),
            fallback_code_lines(3, Language::Swift)
        );
    }
}
