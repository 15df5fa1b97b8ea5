//! CLI smoke tests for sanmatrix.
//!
//! Every command runs against a scrubbed environment so the host's compiler
//! variables cannot leak into the results.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// A sanmatrix command with only the required variables set.
fn sanmatrix_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("sanmatrix");
  cmd
    .env_clear()
    .env("DEFAULT_C", "/opt/llvm/bin/clang")
    .env("FLOATZONE_C", "/opt/floatzone/bin/clang")
    .env("FLOATZONE_SPEC06", "/data/spec2006");
  cmd
}

fn temp_manifest(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("matrix.toml"), content).unwrap();
  temp
}

const MANIFEST: &str = r#"
[[variant]]
prefix = "baseline"
kind = "clang"
compiler = "default"
opt_levels = ["O2"]

[[variant]]
prefix = "instrumented"
kind = "asan"
compiler = "default"
opt_levels = ["O2"]

[[target]]
suite = "suiteA"
source = "/srv/suiteA"
source_kind = "installed"
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  sanmatrix_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  sanmatrix_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("sanmatrix"));
}

// =============================================================================
// Built-in matrix
// =============================================================================

#[test]
fn list_shows_builtin_variants() {
  sanmatrix_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("default_O2"))
    .stdout(predicate::str::contains("asan_O0"))
    .stdout(predicate::str::contains("floatzone_O0"))
    .stdout(predicate::str::contains("juliet"));
}

#[test]
fn list_json_counts_pairs() {
  let output = sanmatrix_cmd().args(["list", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["variants"].as_array().unwrap().len(), 6);
  assert_eq!(json["pairs"], 12);
  assert_eq!(json["targets"][0]["suite"], "spec2006");
}

#[test]
fn spec2017_is_listed_when_configured() {
  sanmatrix_cmd()
    .env("FLOATZONE_SPEC17", "/data/spec2017")
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("spec2017"));
}

#[test]
fn missing_compiler_variable_fails() {
  sanmatrix_cmd()
    .env_remove("DEFAULT_C")
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("DEFAULT_C"));
}

#[test]
fn plan_prints_asan_runtime_options() {
  sanmatrix_cmd()
    .args(["plan", "--variant", "asan_O2", "--target", "juliet"])
    .assert()
    .success()
    .stdout(predicate::str::contains("-fsanitize=address"))
    .stdout(predicate::str::contains("ASAN_OPTIONS=detect_leaks=0"))
    .stdout(predicate::str::contains("1 builds planned"));
}

#[test]
fn plan_json_is_deterministic() {
  let run = || {
    sanmatrix_cmd()
      .args(["plan", "-o", "json"])
      .output()
      .unwrap()
      .stdout
  };
  let first = run();
  assert_eq!(first, run());

  let json: serde_json::Value = serde_json::from_slice(&first).unwrap();
  assert_eq!(json["builds"].as_array().unwrap().len(), 12);
  assert_eq!(json["builds"][0]["variant"], "default_O2");
  assert_eq!(json["builds"][1]["variant"], "default_O2");
  assert_eq!(json["builds"][2]["variant"], "default_O0");
  assert_eq!(json["fingerprint"].as_str().unwrap().len(), 20);
}

#[test]
fn plan_with_unmatched_filter_fails() {
  sanmatrix_cmd()
    .args(["plan", "--variant", "nope_O3"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no (variant, target) pairs"));
}

#[test]
fn env_exports_asan_options() {
  sanmatrix_cmd()
    .args(["env", "asan_O0"])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("export ASAN_OPTIONS='detect_leaks=0:"));
}

#[test]
fn env_of_plain_variant_is_empty() {
  sanmatrix_cmd()
    .args(["env", "default_O2"])
    .assert()
    .success()
    .stdout(predicate::str::is_empty());
}

#[test]
fn env_of_unknown_variant_fails() {
  sanmatrix_cmd()
    .args(["env", "missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown variant"));
}

// =============================================================================
// Manifest
// =============================================================================

#[test]
fn manifest_replaces_builtin_matrix() {
  let temp = temp_manifest(MANIFEST);
  let output = sanmatrix_cmd()
    .arg("--config")
    .arg(temp.path().join("matrix.toml"))
    .args(["plan", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let builds = json["builds"].as_array().unwrap();
  assert_eq!(builds.len(), 2);
  assert_eq!(builds[0]["variant"], "baseline_O2");
  assert_eq!(builds[1]["variant"], "instrumented_O2");
  assert_eq!(builds[1]["target"]["suite"], "suiteA");
}

#[test]
fn manifest_with_bad_source_kind_fails() {
  let temp = temp_manifest(&MANIFEST.replace("\"installed\"", "\"zipfile\""));
  sanmatrix_cmd()
    .arg("--config")
    .arg(temp.path().join("matrix.toml"))
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unrecognized source kind 'zipfile'"));
}

#[test]
fn missing_manifest_fails() {
  let temp = TempDir::new().unwrap();
  sanmatrix_cmd()
    .arg("--config")
    .arg(temp.path().join("absent.toml"))
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to read manifest"));
}
