//! Compile command integration tests.

use predicates::prelude::*;

use super::common::{FOO, TestEnv};

#[test]
fn compile_from_file_lists_artifacts() {
  let env = TestEnv::new();
  let source = env.write_file("Foo.lua", FOO);

  env
    .hotchunk_cmd()
    .arg("compile")
    .arg("pkg.Foo")
    .arg(&source)
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled pkg.Foo"))
    .stdout(predicate::str::contains("pkg.Foo:"));
}

#[test]
fn compile_stages_source_under_source_root() {
  let env = TestEnv::new();
  let source = env.write_file("Foo.lua", FOO);

  env
    .hotchunk_cmd()
    .arg("--source-root")
    .arg(env.path("staging"))
    .arg("compile")
    .arg("pkg.Foo")
    .arg(&source)
    .assert()
    .success();

  assert_eq!(std::fs::read_to_string(env.path("staging/pkg/Foo.lua")).unwrap(), FOO);
}

#[test]
fn compile_reports_missing_dependency() {
  let env = TestEnv::new();

  env
    .hotchunk_cmd()
    .args(["compile", "app.Main", "=return require('lib.helper')"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("module 'lib.helper' not found on classpath"));
}

#[test]
fn compile_with_classpath_emits_byproducts_as_json() {
  let env = TestEnv::new();
  env.write_file("deps/lib/helper.lua", "return { value = 21 }");

  let output = env
    .hotchunk_cmd()
    .arg("--classpath")
    .arg(env.path("deps"))
    .args(["--output", "json", "compile", "app.Main", "=return require('lib.helper')"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["success"], true);
  let names: Vec<&str> = report["artifacts"]
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["app.Main", "lib.helper"]);
}

#[test]
fn compile_reads_config_file() {
  let env = TestEnv::new();
  env.write_file("deps/lib/helper.lua", "return { value = 21 }");
  let config = env.write_file("hotchunk.toml", "classpath = [\"deps\"]\n");

  env
    .hotchunk_cmd()
    .arg("--config")
    .arg(&config)
    .args(["compile", "app.Main", "=return require('lib.helper')"])
    .assert()
    .success();
}

#[test]
fn compile_unknown_location_fails() {
  let env = TestEnv::new();

  env
    .hotchunk_cmd()
    .args(["compile", "pkg.Foo", "does/not/exist.lua"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Resource not found"));
}
