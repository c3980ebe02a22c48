//! Load sequence tests: compile, persist, inject, clear.

use std::fs;

use hotchunk_lib::{CacheError, ExecutionContext, LuaContext};

use super::common::{FOO, TestEnv, memory_cache};

#[test]
fn end_to_end_load_returns_callable_unit() {
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  let unit = cache
    .load_unit(&mut context, "pkg.Foo", "local M = {} function M.get() return 42 end return M")
    .unwrap();

  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);
}

#[test]
fn identical_source_is_persisted_once() {
  let env = TestEnv::new();
  let mut cache = env.persistent_cache();
  let artifact = env.path("classes/pkg/Foo.luac");

  let mut first = LuaContext::new().unwrap();
  cache.load_unit(&mut first, "pkg.Foo", FOO).unwrap();
  let written = fs::read(&artifact).unwrap();
  let modified = fs::metadata(&artifact).unwrap().modified().unwrap();

  let mut second = LuaContext::new().unwrap();
  let unit = cache.load_unit(&mut second, "pkg.Foo", FOO).unwrap();

  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);
  assert_eq!(fs::read(&artifact).unwrap(), written);
  assert_eq!(fs::metadata(&artifact).unwrap().modified().unwrap(), modified);
  assert!(!env.path("classes/pkg/Foo.luac.bak").exists());
  assert!(!env.path("src/pkg/Foo.lua.bak").exists());
}

#[test]
fn changed_source_keeps_previous_artifact_as_backup() {
  let env = TestEnv::new();
  let mut cache = env.persistent_cache();

  cache.load_unit(&mut LuaContext::new().unwrap(), "pkg.Foo", FOO).unwrap();
  let original = fs::read(env.path("classes/pkg/Foo.luac")).unwrap();

  let mut context = LuaContext::new().unwrap();
  let unit = cache
    .load_unit(&mut context, "pkg.Foo", "return { get = function() return 7 end }")
    .unwrap();

  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 7);
  assert_eq!(fs::read(env.path("classes/pkg/Foo.luac.bak")).unwrap(), original);
  assert_eq!(fs::read_to_string(env.path("src/pkg/Foo.lua.bak")).unwrap(), FOO);
}

#[test]
fn persisted_artifact_loads_in_a_fresh_context() {
  let env = TestEnv::new();
  let mut cache = env.persistent_cache();
  cache.load_unit(&mut LuaContext::new().unwrap(), "pkg.Foo", FOO).unwrap();

  let bytes = fs::read(env.path("classes/pkg/Foo.luac")).unwrap();
  let mut context = LuaContext::new().unwrap();
  context.inject("pkg.Foo", &bytes).unwrap();

  let unit = context.resolve("pkg.Foo").unwrap();
  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);
}

#[test]
fn sequential_loads_do_not_see_each_other() {
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  cache.load_unit(&mut context, "pkg.A", "return 'a'").unwrap();
  assert!(cache.registry().buffer().is_empty());

  let result = cache.compile_source("pkg.B", "return 'b'").unwrap();
  assert_eq!(result.names(), vec!["pkg.B".to_string()]);

  cache.load_unit(&mut context, "pkg.C", "return 'c'").unwrap();
  assert!(cache.registry().buffer().is_empty());
}

#[test]
fn source_errors_surface_as_unit_not_found_with_diagnostics() {
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  let err = cache
    .load_unit(&mut context, "pkg.Broken", "local M = {}\nfunction M.get(\nreturn M\n")
    .unwrap_err();

  match &err {
    CacheError::UnitNotFound {
      name,
      diagnostics,
      produced,
    } => {
      assert_eq!(name, "pkg.Broken");
      assert!(produced.is_empty());
      assert!(diagnostics.iter().any(|d| d.is_error() && d.line.is_some()));
    }
    other => panic!("expected UnitNotFound, got {other}"),
  }
  assert!(err.has_compile_errors());
  assert!(!context.is_defined("pkg.Broken"));
}

#[test]
fn artifacts_are_not_persisted_when_the_root_is_missing() {
  let env = TestEnv::new();
  let config = hotchunk_lib::CacheConfig::new().with_artifact_root(env.path("absent"));
  let mut cache: hotchunk_lib::CompilationCache = hotchunk_lib::CompilationCache::new(&config).unwrap();
  let mut context = LuaContext::new().unwrap();

  let unit = cache.load_unit(&mut context, "pkg.Foo", FOO).unwrap();
  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);
  assert!(!env.path("absent").exists());
}

#[test]
fn artifact_write_failure_is_fatal_and_restores_nothing_partial() {
  let env = TestEnv::new();
  let mut cache = env.persistent_cache();
  env.mkdir("classes/pkg/Foo.luac");
  let mut context = LuaContext::new().unwrap();

  let err = cache.load_unit(&mut context, "pkg.Foo", FOO).unwrap_err();

  assert!(matches!(err, CacheError::Io { .. }), "unexpected error: {err}");
  assert!(env.path("classes/pkg/Foo.luac").is_dir());
  assert!(!context.is_defined("pkg.Foo"));
  assert!(cache.registry().buffer().is_empty());
}

#[test]
fn loading_the_same_name_twice_into_one_context_fails() {
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  cache.load_unit(&mut context, "pkg.Foo", FOO).unwrap();
  let err = cache.load_unit(&mut context, "pkg.Foo", FOO).unwrap_err();
  assert!(matches!(err, CacheError::DuplicateUnit { ref name } if name == "pkg.Foo"));
  assert!(cache.registry().buffer().is_empty());
}
