//! E2E tests for `mockapp gen`: project layout, metadata and failures.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn mockapp_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mockapp"));
    cmd.current_dir(dir);
    // Keep the user's config.toml out of the picture.
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env("MOCKAPP_LOG", "error");
    cmd.env_remove("FORMAT");
    // No cloc on purpose: file sizes come from the fallback ratio.
    cmd.env("PATH", "");
    cmd
}

fn gen_json(dir: &Path, args: &[&str]) -> Value {
    let output = mockapp_cmd(dir)
        .arg("gen")
        .args(args)
        .arg("--json")
        .output()
        .expect("gen should not crash");
    assert!(
        output.status.success(),
        "gen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

// ---------------------------------------------------------------------------
// Successful generation
// ---------------------------------------------------------------------------

#[test]
fn flat_buck_project_is_written() {
    let dir = TempDir::new().expect("tempdir");
    let report = gen_json(
        dir.path(),
        &[
            "-o",
            "out",
            "-g",
            "flat",
            "--module-count",
            "3",
            "--lines-of-code",
            "3000",
        ],
    );

    assert_eq!(report["flavor"], "buck");
    assert_eq!(report["gen_type"], "flat");
    assert_eq!(report["module_count"], 4);
    assert_eq!(report["edge_count"], 3);
    assert_eq!(report["example_command"], "buck project //App:App");

    let out = dir.path().join("out");
    assert!(out.join(".buckconfig").is_file());
    assert!(out.join("App/BUCK").is_file());
    assert!(out.join("App/AppDelegate.swift").is_file());
    assert!(out.join("App/Info.plist").is_file());
    for lib in ["MockLib0", "MockLib1", "MockLib2"] {
        assert!(out.join(lib).join("BUCK").is_file(), "{lib}/BUCK");
        assert!(out.join(lib).join("Sources/File0.swift").is_file());
        assert!(out.join(lib).join("Tests/Empty.swift").is_file());
    }

    let app_delegate = fs::read_to_string(out.join("App/AppDelegate.swift")).expect("read");
    assert!(app_delegate.contains("import MockLib0"));

    let index: Value =
        serde_json::from_str(&fs::read_to_string(out.join("module_index.json")).expect("read"))
            .expect("index JSON");
    assert!(index.as_object().is_some_and(|m| m.len() >= 3));

    let info: Value =
        serde_json::from_str(&fs::read_to_string(out.join("project_info.json")).expect("read"))
            .expect("info JSON");
    assert_eq!(info["gen_type"], "flat");
    assert_eq!(info["budget"]["swift_loc"], 3000);
    assert!(info["generated_at"].is_string());
    assert!(info["generation_time_seconds"].as_f64().is_some());
}

#[test]
fn regeneration_replaces_stale_files() {
    let dir = TempDir::new().expect("tempdir");
    let stale = dir.path().join("out/Stale/BUCK");
    fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
    fs::write(&stale, "old").expect("write");

    gen_json(
        dir.path(),
        &["-o", "out", "-g", "flat", "--module-count", "2", "--lines-of-code", "2000"],
    );

    assert!(!stale.exists());
    assert!(dir.path().join("out/App/BUCK").is_file());
}

#[test]
fn bazel_and_cocoapods_root_files() {
    let dir = TempDir::new().expect("tempdir");
    gen_json(
        dir.path(),
        &[
            "-o",
            "bazel",
            "-g",
            "flat",
            "--module-count",
            "2",
            "--lines-of-code",
            "2000",
            "--flavor",
            "bazel",
        ],
    );
    assert!(dir.path().join("bazel/WORKSPACE").is_file());
    assert!(dir.path().join("bazel/MockLib0/BUILD").is_file());

    gen_json(
        dir.path(),
        &[
            "-o",
            "pods",
            "-g",
            "flat",
            "--module-count",
            "2",
            "--lines-of-code",
            "2000",
            "--flavor",
            "cocoapods",
            "--dynamic-linking",
        ],
    );
    let podfile = fs::read_to_string(dir.path().join("pods/Podfile")).expect("Podfile");
    assert!(podfile.contains(":linkage => :dynamic"));
    assert!(dir.path().join("pods/MockLib1/MockLib1.podspec").is_file());
    assert!(dir.path().join("pods/App/AppContainer.podspec").is_file());
}

#[test]
fn seeded_layered_runs_match() {
    let a = TempDir::new().expect("tempdir");
    let b = TempDir::new().expect("tempdir");
    let args = [
        "-o",
        "out",
        "-g",
        "layered",
        "--module-count",
        "6",
        "--app-layer-count",
        "3",
        "--seed",
        "42",
        "--lines-of-code",
        "6000",
    ];
    let first = gen_json(a.path(), &args);
    let second = gen_json(b.path(), &args);
    assert_eq!(first["graph_hash"], second["graph_hash"]);
    assert_eq!(
        fs::read_to_string(a.path().join("out/App/BUCK")).expect("read"),
        fs::read_to_string(b.path().join("out/App/BUCK")).expect("read")
    );
}

#[test]
fn dot_import_with_loc_file() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("deps.dot"),
        "digraph g {\n  \"//app:Rider\" -> \"//libs:Map\";\n  \"//libs:Map\" -> \"//libs:Net\";\n}\n",
    )
    .expect("write dot");
    fs::write(
        dir.path().join("sizes.json"),
        r#"{"Map": 500, "Net": {"loc": 300, "language": "objc"}}"#,
    )
    .expect("write loc");

    let report = gen_json(
        dir.path(),
        &[
            "-o",
            "out",
            "-g",
            "dot",
            "--dot-file",
            "deps.dot",
            "--dot-root",
            "Rider",
            "--loc-file",
            "sizes.json",
        ],
    );
    assert_eq!(report["module_count"], 3);

    let out = dir.path().join("out");
    assert!(out.join("sizes.json").is_file());
    assert!(out.join("Net/Sources/File0.m").is_file());
    assert!(out.join("Net/Sources/File0.h").is_file());
    assert!(out.join("Map/Sources/File0.swift").is_file());
    let map_buck = fs::read_to_string(out.join("Map/BUCK")).expect("read");
    assert!(map_buck.contains("//Net:Net"));
}

#[test]
fn project_config_supplies_defaults() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("mockapp.toml"),
        "gen_type = \"bs_flat\"\nflavor = \"bazel\"\nbig_module_count = 1\nsmall_module_count = 2\nswift_lines_of_code = 4000\n",
    )
    .expect("write config");

    let report = gen_json(dir.path(), &["-o", "out"]);
    assert_eq!(report["gen_type"], "bs_flat");
    assert_eq!(report["flavor"], "bazel");
    assert_eq!(report["module_count"], 4);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn tiny_budget_reports_code() {
    let dir = TempDir::new().expect("tempdir");
    mockapp_cmd(dir.path())
        .args([
            "gen",
            "-o",
            "out",
            "-g",
            "flat",
            "--module-count",
            "5",
            "--lines-of-code",
            "2",
            "--format",
            "text",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E3003]"))
        .stderr(predicate::str::contains("hint:"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_gen_type_fails() {
    let dir = TempDir::new().expect("tempdir");
    mockapp_cmd(dir.path())
        .args(["gen", "-o", "out", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no topology selected"));
}

#[test]
fn half_dot_arguments_fail_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let output = mockapp_cmd(dir.path())
        .args(["gen", "-o", "out", "-g", "dot", "--dot-root", "App"])
        .env("FORMAT", "json")
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E1002");
}

#[test]
fn cyclic_dump_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("deps.dot"),
        "digraph g {\n\"App\" -> \"A\";\n\"A\" -> \"B\";\n\"B\" -> \"A\";\n}\n",
    )
    .expect("write dot");
    mockapp_cmd(dir.path())
        .args([
            "gen",
            "-o",
            "out",
            "-g",
            "dot",
            "--dot-file",
            "deps.dot",
            "--dot-root",
            "App",
            "--format",
            "text",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]"));
}

#[test]
fn broken_project_config_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("mockapp.toml"), "gen_type = [").expect("write");
    mockapp_cmd(dir.path())
        .args(["gen", "-o", "out", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1003]"));
}

#[test]
fn library_named_app_is_rejected_before_writing() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("deps.dot"), "\"Main\" -> \"App\";\n").expect("write dot");
    mockapp_cmd(dir.path())
        .args([
            "gen",
            "-o",
            "out",
            "-g",
            "dot",
            "--dot-file",
            "deps.dot",
            "--dot-root",
            "Main",
            "--format",
            "text",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2005]"));
    assert!(!dir.path().join("out").exists());
}
