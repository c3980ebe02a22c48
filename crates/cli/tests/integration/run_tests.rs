//! Run command integration tests.

use predicates::prelude::*;

use super::common::{FOO, TestEnv};

#[test]
fn run_calls_exported_function() {
  let env = TestEnv::new();
  let source = env.write_file("Foo.lua", FOO);

  env
    .hotchunk_cmd()
    .arg("run")
    .arg("pkg.Foo")
    .arg(&source)
    .args(["--call", "get"])
    .assert()
    .success()
    .stdout(predicate::str::diff("42\n"));
}

#[test]
fn run_passes_numeric_arguments() {
  let env = TestEnv::new();
  let source = env.write_file("Foo.lua", FOO);

  env
    .hotchunk_cmd()
    .arg("run")
    .arg("pkg.Foo")
    .arg(&source)
    .args(["--call", "add", "40", "2"])
    .assert()
    .success()
    .stdout(predicate::str::diff("42\n"));
}

#[test]
fn run_persists_artifacts_once() {
  let env = TestEnv::new();
  let source = env.write_file("Foo.lua", FOO);
  let classes = env.mkdir("classes");

  for _ in 0..2 {
    env
      .hotchunk_cmd()
      .arg("--artifact-root")
      .arg(&classes)
      .arg("run")
      .arg("pkg.Foo")
      .arg(&source)
      .args(["--call", "get"])
      .assert()
      .success();
  }

  assert!(classes.join("pkg/Foo.luac").is_file());
  assert!(!classes.join("pkg/Foo.luac.bak").exists());
}

#[test]
fn run_json_output() {
  let env = TestEnv::new();

  env
    .hotchunk_cmd()
    .args(["--output", "json", "run", "pkg.Foo", "=return { answer = 42 }"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"answer\": 42"));
}

#[test]
fn run_reports_compile_errors() {
  let env = TestEnv::new();

  env
    .hotchunk_cmd()
    .args(["run", "pkg.Bad", "=return ("])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load pkg.Bad"));
}
