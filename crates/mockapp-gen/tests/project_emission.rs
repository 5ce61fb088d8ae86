//! End-to-end emission: graph in, project tree out.
//!
//! The generated sources must only call into modules they depend on, and
//! Objective-C code must never call Swift-only functions.

use std::path::Path;

use mockapp_core::ModuleGraph;
use mockapp_core::generate::{layered, seeded_rng};
use mockapp_core::import::DotImporter;
use mockapp_gen::project::MODULE_INDEX_FILE;
use mockapp_gen::{
    BuildFlavor, CodeBudget, FileSizes, GenerateError, GeneratedProject, Language,
    PodfileOptions, ProjectGenerator, ProjectOptions, RatioCounter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SIZES: FileSizes = FileSizes {
    swift: 100,
    objc: 80,
};

fn generate(graph: &ModuleGraph, options: ProjectOptions, budget: CodeBudget) -> GeneratedProject {
    ProjectGenerator::with_file_sizes(options, SIZES)
        .generate(graph, &budget, None)
        .expect("project")
}

fn mixed_budget() -> CodeBudget {
    CodeBudget {
        swift_loc: 30_000,
        objc_loc: 10_000,
    }
}

fn layered_graph() -> ModuleGraph {
    layered(4, 5, 3, &mut seeded_rng(Some(17))).expect("graph")
}

fn first_file(project: &GeneratedProject, module: &str, language: Language) -> String {
    let path = format!("{module}/Sources/File0.{}", language.source_extension());
    project.file(&path).expect("first file").to_string()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[test]
fn every_module_imports_exactly_its_dependencies() {
    let graph = layered_graph();
    let project = generate(&graph, ProjectOptions::default(), mixed_budget());

    for (id, node) in graph.libraries() {
        let module = project.index.get(id).expect("module generated");
        let text = first_file(&project, &node.name, module.language);
        for dep in graph.deps_of(id) {
            let import = match module.language {
                Language::Swift => format!("import {}\n", dep.name),
                Language::ObjC => format!("@import {};\n", dep.name),
            };
            assert!(text.contains(&import), "{} misses {import}", node.name);
        }
        let imports = text
            .lines()
            .filter(|l| l.starts_with("import Mock") || l.starts_with("@import Mock"))
            .count();
        assert_eq!(imports, node.deps.len(), "{}", node.name);
    }
}

#[test]
fn objc_sources_never_call_swift_only_functions() {
    let graph = layered_graph();
    let project = generate(&graph, ProjectOptions::default(), mixed_budget());

    let objc: Vec<_> = project
        .index
        .iter()
        .filter(|(_, m)| m.language == Language::ObjC)
        .collect();
    assert!(!objc.is_empty(), "budget should produce Objective-C modules");
    for (_, module) in objc {
        let text = first_file(&project, &module.name, Language::ObjC);
        assert!(!text.contains("complexCrap0(arg:"));
        assert!(!text.contains("().complex"));
    }
}

#[test]
fn app_delegate_calls_first_app_dependency() {
    let graph = layered_graph();
    let project = generate(&graph, ProjectOptions::default(), mixed_budget());
    let first_dep = graph.deps_of(graph.app_id()).next().expect("app dep");
    let main = project.file("App/AppDelegate.swift").expect("app delegate");
    assert!(main.contains(&format!("import {}\n", first_dep.name)));
    assert!(main.contains("        _ = MyClass"));
}

#[test]
fn file_counts_match_allocations() {
    let graph = layered_graph();
    let project = generate(&graph, ProjectOptions::default(), mixed_budget());
    for alloc in &project.allocations {
        let module = project.index.get(alloc.module).expect("module");
        assert_eq!(module.files.len() as u64, alloc.file_count);
        assert_eq!(module.loc, alloc.loc);
    }
}

// ---------------------------------------------------------------------------
// Build files
// ---------------------------------------------------------------------------

#[test]
fn buck_labels_use_module_path_and_wmo() {
    let graph = layered_graph();
    let options = ProjectOptions {
        flavor: BuildFlavor::Buck,
        use_wmo: true,
        module_path: "mock".into(),
        podfile: PodfileOptions::default(),
    };
    let project = generate(&graph, options, mixed_budget());
    let app = project.file("App/BUCK").expect("app BUCK");
    for dep in graph.deps_of(graph.app_id()) {
        assert!(app.contains(&format!("'//mock/{0}:{0}',", dep.name)));
    }
    assert!(app.contains("'SWIFT_WHOLE_MODULE_OPTIMIZATION': 'YES'"));
    assert_eq!(app.matches("Scheme',").count(), graph.libraries().count());
}

#[test]
fn cocoapods_podfile_options() {
    let graph = layered_graph();
    let options = ProjectOptions {
        flavor: BuildFlavor::CocoaPods,
        use_wmo: false,
        module_path: String::new(),
        podfile: PodfileOptions {
            dynamic_linking: true,
            deterministic_uuids: false,
            multiple_pod_projects: true,
        },
    };
    let project = generate(&graph, options, mixed_budget());
    let podfile = project.file("Podfile").expect("Podfile");
    assert!(podfile.contains(":linkage => :dynamic"));
    assert!(podfile.contains(":deterministic_uuids => false"));
    assert!(podfile.contains(":generate_multiple_pod_projects => true"));
    assert!(podfile.contains(":appspecs => ['App']"));
    assert_eq!(podfile.matches(".podspec'\n").count(), graph.libraries().count());
}

#[test]
fn bazel_uses_rule_per_language() {
    let graph = layered_graph();
    let options = ProjectOptions {
        flavor: BuildFlavor::Bazel,
        ..ProjectOptions::default()
    };
    let project = generate(&graph, options, mixed_budget());
    for (_, module) in project.index.iter() {
        let build = project
            .file(Path::new(&module.name).join("BUILD"))
            .expect("BUILD");
        match module.language {
            Language::Swift => assert!(build.contains("swift_library(")),
            Language::ObjC => assert!(build.contains("objc_library(")),
        }
    }
}

// ---------------------------------------------------------------------------
// Imported graphs and disk output
// ---------------------------------------------------------------------------

#[test]
fn imported_graph_round_trips_to_disk() {
    let dot = r#"digraph G {
  "//App:App" -> "//Feature:Feature";
  "//Feature:Feature" -> "//Core:Core";
  "//App:App" -> "//Core:Core";
}"#;
    let graph = DotImporter::default()
        .import_str(dot, "App")
        .expect("import");
    let generator = ProjectGenerator::new(ProjectOptions::default(), &RatioCounter);
    let project = generator
        .generate(
            &graph,
            &CodeBudget {
                swift_loc: 2000,
                objc_loc: 0,
            },
            None,
        )
        .expect("project");

    let dir = tempfile::tempdir().expect("tempdir");
    project.write_to(dir.path()).expect("write");

    let index_text = std::fs::read_to_string(dir.path().join(MODULE_INDEX_FILE)).expect("index");
    let index: serde_json::Value = serde_json::from_str(&index_text).expect("json");
    let names: Vec<&str> = index
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["Core", "Feature"]);
    assert!(dir.path().join("Feature/Sources/File0.swift").is_file());
    assert_eq!(generator.example_command(), "buck project //App:App");
}

#[test]
fn library_named_like_app_directory_is_rejected() {
    let graph = DotImporter::default()
        .import_str("\"Main\" -> \"App\";\n", "Main")
        .expect("import");
    let err = ProjectGenerator::with_file_sizes(ProjectOptions::default(), SIZES)
        .generate(&graph, &mixed_budget(), None)
        .expect_err("reserved");
    assert!(matches!(
        &err,
        GenerateError::ReservedName { module } if module == "App"
    ));
    assert_eq!(err.code().code(), "E2005");
}

#[test]
fn library_named_like_root_file_is_rejected() {
    for name in ["Podfile", "workspace", "module_index.json"] {
        let dot = format!("\"Main\" -> \"{name}\";\n");
        let graph = DotImporter::default()
            .import_str(&dot, "Main")
            .expect("import");
        let err = ProjectGenerator::with_file_sizes(ProjectOptions::default(), SIZES)
            .generate(&graph, &mixed_budget(), None)
            .expect_err("reserved");
        assert!(matches!(err, GenerateError::ReservedName { .. }), "{name}");
    }
}
