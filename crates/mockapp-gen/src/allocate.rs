//! Code volume allocation.
//!
//! Splits a lines-of-code budget over a graph's libraries proportionally to
//! their code units, picks a language per module and derives how many files
//! each module needs.
//!
//! # Language split
//!
//! The Swift share of the budget, rounded to two decimals, decides how many
//! libraries are Swift: the first `ceil(libraries * share)` libraries in
//! graph order are Swift and the rest are Objective-C. All arithmetic is
//! integral (shares are in hundredths) so the split is exact and
//! platform-independent.
//!
//! # File counts
//!
//! `file_count = max(file_size, lines_per_unit) * code_units / file_size`,
//! so every module with lines gets at least one file and big modules get
//! proportionally more.

use mockapp_core::{ModuleGraph, ModuleId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AllocationError;
use crate::language::Language;
use crate::loc::FileSizes;
use crate::locfile::LocOverrides;

/// Target lines of code per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBudget {
    pub swift_loc: u64,
    pub objc_loc: u64,
}

impl Default for CodeBudget {
    fn default() -> Self {
        Self {
            swift_loc: 1_500_000,
            objc_loc: 0,
        }
    }
}

impl CodeBudget {
    /// Combined budget, saturating at `u64::MAX`.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.swift_loc.saturating_add(self.objc_loc)
    }

    /// Swift share of the total in hundredths, rounded half up.
    #[must_use]
    pub fn swift_percent(&self) -> u64 {
        let swift = u128::from(self.swift_loc);
        let total = swift + u128::from(self.objc_loc);
        if total == 0 {
            return 0;
        }
        u64::try_from((swift * 200 + total) / (2 * total)).unwrap_or(100)
    }
}

/// What one library gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleAllocation {
    pub module: ModuleId,
    pub name: String,
    pub language: Language,
    /// Lines of code assigned to the module.
    pub loc: u64,
    pub file_count: u64,
}

/// Allocate `budget` (or the per-module `overrides`) over the libraries of
/// `graph`, in graph order.
///
/// # Errors
///
/// - [`AllocationError::ZeroCodeUnits`] if the graph has no library units.
/// - [`AllocationError::MissingOverride`] if `overrides` lacks a library.
/// - [`AllocationError::EmptyBudget`] if the budget is zero.
/// - [`AllocationError::BudgetTooSmall`] if a library would get no lines.
#[instrument(skip(graph, overrides), fields(modules = graph.len()))]
pub fn allocate(
    graph: &ModuleGraph,
    budget: &CodeBudget,
    sizes: &FileSizes,
    overrides: Option<&LocOverrides>,
) -> Result<Vec<ModuleAllocation>, AllocationError> {
    let total_units = graph.library_code_units();
    if total_units == 0 {
        return Err(AllocationError::ZeroCodeUnits);
    }

    let allocations = match overrides {
        Some(overrides) => allocate_from_overrides(graph, sizes, overrides)?,
        None => allocate_from_budget(graph, budget, sizes, total_units)?,
    };
    debug!(
        modules = allocations.len(),
        files = allocations.iter().map(|a| a.file_count).sum::<u64>(),
        "allocated code volume"
    );
    Ok(allocations)
}

fn allocate_from_overrides(
    graph: &ModuleGraph,
    sizes: &FileSizes,
    overrides: &LocOverrides,
) -> Result<Vec<ModuleAllocation>, AllocationError> {
    graph
        .libraries()
        .map(|(id, node)| {
            let entry = overrides
                .get(&node.name)
                .ok_or_else(|| AllocationError::MissingOverride {
                    module: node.name.clone(),
                })?;
            let loc = entry.loc();
            if loc == 0 {
                return Err(AllocationError::BudgetTooSmall {
                    module: node.name.clone(),
                });
            }
            let size = sizes.for_language(entry.language());
            Ok(ModuleAllocation {
                module: id,
                name: node.name.clone(),
                language: entry.language(),
                loc,
                file_count: loc.max(size) / size,
            })
        })
        .collect()
}

fn allocate_from_budget(
    graph: &ModuleGraph,
    budget: &CodeBudget,
    sizes: &FileSizes,
    total_units: u64,
) -> Result<Vec<ModuleAllocation>, AllocationError> {
    let total_lines = budget.total();
    if total_lines == 0 {
        return Err(AllocationError::EmptyBudget);
    }
    let lines_per_unit = total_lines / total_units;

    let library_count = graph.libraries().count() as u64;
    let max_swift_index = (library_count * budget.swift_percent()).div_ceil(100);
    debug!(lines_per_unit, max_swift_index, "weight-based allocation");

    graph
        .libraries()
        .zip(0_u64..)
        .map(|((id, node), idx)| {
            let units = u64::from(node.code_units);
            let loc = lines_per_unit * units;
            if loc == 0 {
                return Err(AllocationError::BudgetTooSmall {
                    module: node.name.clone(),
                });
            }
            let language = if idx < max_swift_index {
                Language::Swift
            } else {
                Language::ObjC
            };
            let size = sizes.for_language(language);
            Ok(ModuleAllocation {
                module: id,
                name: node.name.clone(),
                language,
                loc,
                file_count: lines_per_unit.max(size) * units / size,
            })
        })
        .collect()
}
