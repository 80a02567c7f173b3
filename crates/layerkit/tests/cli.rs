//! End-to-end tests for the layerkit binary against local template sources

use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, body: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, body).unwrap();
}

/// Template repository laid out with the conventional `template/` folder
fn template() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "template/content/index.md", "# Hello");
    write(dir.path(), "template/tailwind.config.ts", "export default {}");
    write(dir.path(), "template/package.json", "{}");
    write(dir.path(), "template/README.md", "readme");
    write(dir.path(), "template/components/AppHeader.vue", "<header/>");
    write(dir.path(), "template/INFO.md", "about this template");
    dir
}

fn nuxt_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "package.json", r#"{"name":"site","dependencies":{"nuxt":"^3.12.0"}}"#);
    write(dir.path(), "nuxt.config.ts", "export default defineNuxtConfig({})");
    dir
}

fn layerkit(template: &Path, target: &Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("layerkit");
    cmd.env_remove("LAYERKIT_TEMPLATE_URL")
        .env_remove("RUST_LOG")
        .arg(target)
        .arg("--source")
        .arg(template)
        .arg("--no-color");
    cmd
}

fn json_of(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_help_flag() {
    cargo::cargo_bin_cmd!("layerkit")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--without-content"))
        .stdout(predicate::str::contains("--include-docs"));
}

#[test]
fn test_conflicting_flags_exit_with_usage_error() {
    cargo::cargo_bin_cmd!("layerkit")
        .args(["--all", "--without-tailwind"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_target_is_usage_error() {
    let template = template();
    let scratch = TempDir::new().unwrap();
    layerkit(template.path(), &scratch.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Target directory not found"));
}

#[test]
fn test_target_without_framework_marker_is_rejected() {
    let template = template();
    let target = TempDir::new().unwrap();
    write(target.path(), "package.json", "{}");
    layerkit(template.path(), target.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not an eligible project"));
}

#[test]
fn test_default_run_adds_only_ungated_files() {
    let template = template();
    let target = nuxt_project();

    let output = layerkit(template.path(), target.path())
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report = json_of(&output);

    assert_eq!(report["source"]["mode"], "local");
    assert_eq!(report["counts"]["add"], 2);
    assert_eq!(report["counts"]["exclude"], 4);
    assert!(target.path().join("components/AppHeader.vue").is_file());
    assert!(target.path().join("INFO.md").is_file());
    assert!(!target.path().join("content").exists());
    assert!(!target.path().join("README.md").exists());
    assert!(!target.path().join(".layerkit.lock").exists());
}

#[test]
fn test_all_with_clean_and_docs() {
    let template = template();
    let target = nuxt_project();

    layerkit(template.path(), target.path())
        .args(["--all", "--clean", "--include-docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ content/index.md added"))
        .stdout(predicate::str::contains("- INFO.md info-clean"));

    assert!(target.path().join("content/index.md").is_file());
    assert!(target.path().join("tailwind.config.ts").is_file());
    assert!(target.path().join("README.md").is_file());
    assert!(!target.path().join("INFO.md").exists());
    assert_eq!(
        fs::read_to_string(target.path().join("package.json")).unwrap(),
        r#"{"name":"site","dependencies":{"nuxt":"^3.12.0"}}"#
    );
}

#[test]
fn test_second_run_adds_nothing() {
    let template = template();
    let target = nuxt_project();

    layerkit(template.path(), target.path()).arg("--all").assert().success();

    let output = layerkit(template.path(), target.path())
        .args(["--all", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report = json_of(&output);
    assert_eq!(report["counts"]["add"], 0);
    assert_eq!(report["counts"]["skip"], 4);
}

#[test]
fn test_dry_run_and_list_write_nothing() {
    let template = template();
    let target = nuxt_project();

    layerkit(template.path(), target.path())
        .args(["--all", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(dry run)"));

    let output = layerkit(template.path(), target.path())
        .args(["--all", "--list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(json_of(&output)["list"], true);
    assert!(!target.path().join("content").exists());
}

#[test]
fn test_detected_tailwind_dependency() {
    let template = template();
    let target = nuxt_project();
    write(
        target.path(),
        "package.json",
        r#"{"devDependencies":{"@nuxtjs/tailwindcss":"^6.0.0"}}"#,
    );

    let output = layerkit(template.path(), target.path())
        .args(["--list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report = json_of(&output);
    assert_eq!(report["features"]["detected"]["tailwind"], true);
    assert_eq!(report["features"]["effective"]["content"], false);
}

#[test]
fn test_source_from_environment() {
    let template = template();
    let target = nuxt_project();

    cargo::cargo_bin_cmd!("layerkit")
        .env("LAYERKIT_TEMPLATE_URL", template.path())
        .arg(target.path())
        .args(["--list", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("components/AppHeader.vue"));
}

#[test]
fn test_empty_template_exit_code() {
    let template = TempDir::new().unwrap();
    fs::create_dir(template.path().join("template")).unwrap();
    let target = nuxt_project();

    layerkit(template.path(), target.path())
        .arg("--json")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("contains no files"));
}

#[test]
fn test_copy_error_exit_code() {
    let template = template();
    let target = nuxt_project();
    // A file where a directory is needed makes the content copy fail
    write(target.path(), "content", "not a directory");

    layerkit(template.path(), target.path())
        .arg("--all")
        .assert()
        .code(3);

    assert!(target.path().join("tailwind.config.ts").is_file());
}

#[test]
fn test_live_lock_blocks_run() {
    let template = template();
    let target = nuxt_project();
    let lock = format!(r#"{{"pid":{},"created_at":0}}"#, std::process::id());
    write(target.path(), ".layerkit.lock", &lock);

    layerkit(template.path(), target.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("holds the lock"));

    assert_eq!(fs::read_to_string(target.path().join(".layerkit.lock")).unwrap(), lock);
}
