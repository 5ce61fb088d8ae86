//! Project emission.
//!
//! [`ProjectGenerator::generate`] turns a [`ModuleGraph`] into the full set
//! of files for a mock app: one directory per library with sources, an
//! empty test target and a build declaration, plus the `App` directory and
//! the build-system root files. Files are produced in memory first so a
//! failed generation never leaves a half-written tree behind.
//!
//! Libraries are emitted in graph order. A module's generated symbols are
//! recorded in the [`ModuleIndex`] right after it is emitted, and dependents
//! read them from there to render call sites, so the graph must list every
//! dependency before its dependents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mockapp_core::{IdGenerator, ModuleGraph, ModuleId, ModuleNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::allocate::{CodeBudget, ModuleAllocation, allocate};
use crate::buildfiles::{
    BAZEL_WORKSPACE, BUCKCONFIG, BuildFileWriter, BuildFlavor, INFO_PLIST, PodfileOptions,
};
use crate::error::GenerateError;
use crate::filegen::{
    CLASSES_PER_FILE, FUNCTIONS_PER_CLASS, GeneratedModule, ObjcHeaderFileGenerator,
    ObjcSourceFileGenerator, SwiftFileGenerator,
};
use crate::language::Language;
use crate::loc::{FileSizes, LineCounter};
use crate::locfile::LocOverrides;

/// Directory holding the app target.
pub const APP_DIR: &str = "App";

/// Per-module summary file written at the project root.
pub const MODULE_INDEX_FILE: &str = "module_index.json";

/// Run metadata written at the project root by the CLI.
pub const PROJECT_INFO_FILE: &str = "project_info.json";

/// Top-level paths the generator owns. A library with one of these names
/// (compared case-insensitively) would overwrite or shadow it.
pub const RESERVED_NAMES: &[&str] = &[
    APP_DIR,
    MODULE_INDEX_FILE,
    PROJECT_INFO_FILE,
    ".buckconfig",
    "WORKSPACE",
    "Podfile",
];

const EMPTY_TEST: &str = "import XCTest\n";
const DUMMY_SWIFT: &str = "// Placeholder so the container pod has a source file.\n";

/// How the project should be laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOptions {
    pub flavor: BuildFlavor,
    /// Enable whole-module optimization in every target.
    pub use_wmo: bool,
    /// Directory of the modules relative to the build root, used in target
    /// labels. Empty means the build root itself.
    pub module_path: String,
    pub podfile: PodfileOptions,
}

/// Entry of `module_index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub file_count: usize,
    pub loc: u64,
    pub language: Language,
}

/// Generated libraries keyed by graph node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleIndex(BTreeMap<ModuleId, GeneratedModule>);

impl ModuleIndex {
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&GeneratedModule> {
        self.0.get(&id)
    }

    pub fn insert(&mut self, id: ModuleId, module: GeneratedModule) {
        self.0.insert(id, module);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &GeneratedModule)> {
        self.0.iter().map(|(id, module)| (*id, module))
    }

    /// Sum of allocated lines over all modules.
    #[must_use]
    pub fn total_loc(&self) -> u64 {
        self.0.values().map(|m| m.loc).sum()
    }

    /// Module name → summary, as written to [`MODULE_INDEX_FILE`].
    #[must_use]
    pub fn summary(&self) -> BTreeMap<String, ModuleSummary> {
        self.0
            .values()
            .map(|m| {
                (
                    m.name.clone(),
                    ModuleSummary {
                        file_count: m.files.len(),
                        loc: m.loc,
                        language: m.language,
                    },
                )
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns the serialization error.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary())
    }
}

/// Everything one generation run produced, not yet on disk.
#[derive(Debug, Clone, Default)]
pub struct GeneratedProject {
    /// Path relative to the project root → contents.
    pub files: BTreeMap<PathBuf, String>,
    pub index: ModuleIndex,
    pub allocations: Vec<ModuleAllocation>,
}

impl GeneratedProject {
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Write every file under `root`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    #[instrument(skip(self), fields(files = self.files.len()))]
    pub fn write_to(&self, root: &Path) -> std::io::Result<()> {
        for (relative, text) in &self.files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, text)?;
        }
        info!(root = %root.display(), files = self.files.len(), "wrote project");
        Ok(())
    }
}

/// Emits projects for one build flavor.
#[derive(Debug, Clone)]
pub struct ProjectGenerator {
    options: ProjectOptions,
    sizes: FileSizes,
    writer: BuildFileWriter,
}

impl ProjectGenerator {
    /// Measure generated file sizes with `counter` and build a generator.
    #[must_use]
    pub fn new(options: ProjectOptions, counter: &dyn LineCounter) -> Self {
        Self::with_file_sizes(options, FileSizes::measure(counter))
    }

    #[must_use]
    pub fn with_file_sizes(options: ProjectOptions, sizes: FileSizes) -> Self {
        let writer = BuildFileWriter::new(
            options.flavor,
            options.use_wmo,
            &options.module_path,
            options.podfile,
        );
        Self {
            options,
            sizes,
            writer,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &ProjectOptions {
        &self.options
    }

    #[must_use]
    pub const fn file_sizes(&self) -> FileSizes {
        self.sizes
    }

    #[must_use]
    pub const fn example_command(&self) -> &'static str {
        self.options.flavor.example_command()
    }

    /// Allocate code volume over `graph` and render every project file.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::Allocation`] if the budget cannot be distributed.
    /// - [`GenerateError::OutOfOrder`] if a library precedes one of its
    ///   dependencies in `graph`.
    /// - [`GenerateError::FileGen`] if a call site cannot be rendered.
    /// - [`GenerateError::ReservedName`] if a library is named like one of
    ///   [`RESERVED_NAMES`].
    #[instrument(skip_all, fields(flavor = self.options.flavor.as_str(), modules = graph.len()))]
    pub fn generate(
        &self,
        graph: &ModuleGraph,
        budget: &CodeBudget,
        overrides: Option<&LocOverrides>,
    ) -> Result<GeneratedProject, GenerateError> {
        if let Some((_, node)) = graph.libraries().find(|(_, node)| is_reserved(&node.name)) {
            return Err(GenerateError::ReservedName {
                module: node.name.clone(),
            });
        }
        let allocations = allocate(graph, budget, &self.sizes, overrides)?;
        let mut project = GeneratedProject::default();
        let mut ids = IdGenerator::new();

        for alloc in &allocations {
            let Some(node) = graph.node(alloc.module) else {
                continue;
            };
            let module = {
                let deps = generated_deps(graph, &project.index, node)?;
                self.emit_library(&mut ids, node, alloc, &deps, &mut project.files)
            };
            debug!(
                module = %module.name,
                language = %module.language,
                files = module.files.len(),
                "generated module"
            );
            project.index.insert(alloc.module, module);
        }

        self.emit_app(graph, &project.index, &mut project.files)?;
        let index_json = project.index.to_json()?;
        project
            .files
            .insert(PathBuf::from(MODULE_INDEX_FILE), index_json + "\n");
        project.allocations = allocations;

        info!(
            modules = project.index.len(),
            files = project.files.len(),
            loc = project.index.total_loc(),
            "generated project"
        );
        Ok(project)
    }

    fn emit_library(
        &self,
        ids: &mut IdGenerator,
        node: &ModuleNode,
        alloc: &ModuleAllocation,
        deps: &[&GeneratedModule],
        files: &mut BTreeMap<PathBuf, String>,
    ) -> GeneratedModule {
        let dir = PathBuf::from(&node.name);
        let sources = dir.join("Sources");
        let mut module = GeneratedModule {
            name: node.name.clone(),
            language: alloc.language,
            loc: alloc.loc,
            files: BTreeMap::new(),
        };

        for i in 0..alloc.file_count {
            let file_name = format!("File{i}.{}", alloc.language.source_extension());
            let file = match alloc.language {
                Language::Swift => SwiftFileGenerator.gen_file(
                    ids,
                    CLASSES_PER_FILE,
                    FUNCTIONS_PER_CLASS,
                    deps,
                ),
                Language::ObjC => {
                    let header_name = format!("File{i}.h");
                    let source = ObjcSourceFileGenerator.gen_file(
                        ids,
                        CLASSES_PER_FILE,
                        FUNCTIONS_PER_CLASS,
                        deps,
                        Some(&header_name),
                    );
                    let header = ObjcHeaderFileGenerator.gen_file(&source.index);
                    files.insert(sources.join(&header_name), header.text);
                    source
                }
            };
            files.insert(sources.join(&file_name), file.text);
            module.files.insert(file_name, file.index);
        }

        files.insert(dir.join("Tests").join("Empty.swift"), EMPTY_TEST.to_string());

        let dep_names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        files.insert(
            dir.join(self.options.flavor.library_build_file(&node.name)),
            self.writer.library(&node.name, alloc.language, &dep_names),
        );
        module
    }

    fn emit_app(
        &self,
        graph: &ModuleGraph,
        index: &ModuleIndex,
        files: &mut BTreeMap<PathBuf, String>,
    ) -> Result<(), GenerateError> {
        let app = graph.app();
        let deps = generated_deps(graph, index, app)?;
        let dir = PathBuf::from(APP_DIR);

        let main = SwiftFileGenerator.gen_main(deps.first().copied())?;
        files.insert(dir.join("AppDelegate.swift"), main);
        files.insert(dir.join("Info.plist"), INFO_PLIST.to_string());

        let dep_names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        let all_libraries: Vec<&str> = index.iter().map(|(_, m)| m.name.as_str()).collect();
        let app_decl = self.writer.app(&dep_names, &all_libraries);

        match self.options.flavor {
            BuildFlavor::Buck => {
                files.insert(dir.join("BUCK"), app_decl);
                files.insert(PathBuf::from(".buckconfig"), BUCKCONFIG.to_string());
            }
            BuildFlavor::Bazel => {
                files.insert(dir.join("BUILD"), app_decl);
                files.insert(PathBuf::from("WORKSPACE"), BAZEL_WORKSPACE.to_string());
            }
            BuildFlavor::CocoaPods => {
                files.insert(dir.join("AppContainer.podspec"), app_decl);
                files.insert(dir.join("dummy.swift"), DUMMY_SWIFT.to_string());
                files.insert(
                    PathBuf::from("Podfile"),
                    self.writer.podfile(&all_libraries),
                );
            }
        }
        Ok(())
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// The already generated modules `node` depends on, in declaration order.
fn generated_deps<'a>(
    graph: &ModuleGraph,
    index: &'a ModuleIndex,
    node: &ModuleNode,
) -> Result<Vec<&'a GeneratedModule>, GenerateError> {
    node.deps
        .iter()
        .map(|dep| {
            index.get(*dep).ok_or_else(|| GenerateError::OutOfOrder {
                module: node.name.clone(),
                dependency: graph
                    .node(*dep)
                    .map_or_else(|| dep.to_string(), |n| n.name.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapp_core::generate::flat;

    const SIZES: FileSizes = FileSizes {
        swift: 100,
        objc: 50,
    };

    fn generator(flavor: BuildFlavor) -> ProjectGenerator {
        ProjectGenerator::with_file_sizes(
            ProjectOptions {
                flavor,
                ..ProjectOptions::default()
            },
            SIZES,
        )
    }

    fn budget(swift_loc: u64) -> CodeBudget {
        CodeBudget {
            swift_loc,
            objc_loc: 0,
        }
    }

    /// App -> B -> A, declared in that (wrong) order.
    fn chain_out_of_order() -> ModuleGraph {
        ModuleGraph::new(
            vec![
                ModuleNode::app("App", vec![ModuleId(1)]),
                ModuleNode::library("B").with_deps(vec![ModuleId(2)]),
                ModuleNode::library("A"),
            ],
            ModuleId(0),
        )
        .expect("graph")
    }

    #[test]
    fn buck_layout() {
        let g = flat(2).expect("graph");
        let project = generator(BuildFlavor::Buck)
            .generate(&g, &budget(400), None)
            .expect("project");

        for path in [
            "MockLib0/Sources/File0.swift",
            "MockLib0/Sources/File1.swift",
            "MockLib0/Tests/Empty.swift",
            "MockLib0/BUCK",
            "MockLib1/BUCK",
            "App/BUCK",
            "App/AppDelegate.swift",
            "App/Info.plist",
            ".buckconfig",
            MODULE_INDEX_FILE,
        ] {
            assert!(project.file(path).is_some(), "missing {path}");
        }
        assert!(project.file("WORKSPACE").is_none());
        assert_eq!(project.index.len(), 2);
    }

    #[test]
    fn class_ids_are_unique_across_modules() {
        let g = flat(2).expect("graph");
        let project = generator(BuildFlavor::Buck)
            .generate(&g, &budget(400), None)
            .expect("project");
        let mut seen = std::collections::BTreeSet::new();
        for (_, module) in project.index.iter() {
            for file in module.files.values() {
                for class_id in file.classes.keys() {
                    assert!(seen.insert(*class_id), "class {class_id} reused");
                }
            }
        }
        assert_eq!(seen.len(), 4 * CLASSES_PER_FILE);
    }

    #[test]
    fn bazel_and_cocoapods_root_files() {
        let g = flat(1).expect("graph");
        let bazel = generator(BuildFlavor::Bazel)
            .generate(&g, &budget(100), None)
            .expect("project");
        assert!(bazel.file("WORKSPACE").is_some());
        assert!(bazel.file("App/BUILD").is_some());
        assert!(bazel.file("MockLib0/BUILD").is_some());

        let pods = generator(BuildFlavor::CocoaPods)
            .generate(&g, &budget(100), None)
            .expect("project");
        assert!(pods.file("Podfile").expect("podfile").contains("pod 'MockLib0'"));
        assert!(pods.file("App/AppContainer.podspec").is_some());
        assert!(pods.file("App/dummy.swift").is_some());
        assert!(pods.file("MockLib0/MockLib0.podspec").is_some());
    }

    #[test]
    fn objc_modules_get_headers() {
        let g = flat(1).expect("graph");
        let budget = CodeBudget {
            swift_loc: 0,
            objc_loc: 100,
        };
        let project = generator(BuildFlavor::Buck)
            .generate(&g, &budget, None)
            .expect("project");
        assert!(project.file("MockLib0/Sources/File0.m").is_some());
        assert!(project.file("MockLib0/Sources/File0.h").is_some());
        let module = project.index.iter().next().expect("module").1;
        assert_eq!(module.files.len(), 2);
        assert!(module.files.keys().all(|name| name.ends_with(".m")));
    }

    #[test]
    fn module_index_json_lists_every_library() {
        let g = flat(3).expect("graph");
        let project = generator(BuildFlavor::Buck)
            .generate(&g, &budget(300), None)
            .expect("project");
        let json: serde_json::Value =
            serde_json::from_str(project.file(MODULE_INDEX_FILE).expect("index")).expect("json");
        assert_eq!(json["MockLib2"]["loc"], 100);
        assert_eq!(json["MockLib2"]["file_count"], 1);
        assert_eq!(json["MockLib2"]["language"], "swift");
    }

    #[test]
    fn out_of_order_graph_is_rejected() {
        let err = generator(BuildFlavor::Buck)
            .generate(&chain_out_of_order(), &budget(1000), None)
            .expect_err("B before A");
        match err {
            GenerateError::OutOfOrder { module, dependency } => {
                assert_eq!((module.as_str(), dependency.as_str()), ("B", "A"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn allocation_errors_propagate() {
        let g = flat(3).expect("graph");
        let err = generator(BuildFlavor::Buck)
            .generate(&g, &budget(0), None)
            .expect_err("empty budget");
        assert!(matches!(err, GenerateError::Allocation(_)));
    }

    #[test]
    fn write_to_creates_tree() {
        let g = flat(1).expect("graph");
        let project = generator(BuildFlavor::Bazel)
            .generate(&g, &budget(100), None)
            .expect("project");
        let dir = tempfile::tempdir().expect("tempdir");
        project.write_to(dir.path()).expect("write");
        assert!(dir.path().join("MockLib0/Sources/File0.swift").is_file());
        assert!(dir.path().join("App/AppDelegate.swift").is_file());
        assert!(dir.path().join(MODULE_INDEX_FILE).is_file());
    }
}
