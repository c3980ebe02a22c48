//! Classpath growth and dependency compilation.

use hotchunk_lib::{CacheError, LuaContext};

use super::common::{TestEnv, memory_cache, write_zip};

const USES_HELPER: &str = "local h = require('lib.helper')\nreturn { get = function() return h.value * 2 end }\n";

#[test]
fn dependency_resolves_only_after_classpath_growth() {
  let env = TestEnv::new();
  env.write_file("deps/lib/helper.lua", "return { value = 21 }");
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  let err = cache.load_unit(&mut context, "app.Main", USES_HELPER).unwrap_err();
  assert!(matches!(err, CacheError::UnitNotFound { .. }));
  assert!(err.has_compile_errors());
  assert!(err.to_string().contains("lib.helper"));

  assert!(cache.add_classpath_entry(env.path("deps")).unwrap());
  let unit = cache.load_unit(&mut context, "app.Main", USES_HELPER).unwrap();
  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);
}

#[test]
fn dependencies_are_emitted_and_persisted_as_byproducts() {
  let env = TestEnv::new();
  env.write_file("deps/lib/helper.lua", "return { value = 21 }");
  let mut cache = env.persistent_cache();
  cache.add_classpath_entry(env.path("deps")).unwrap();

  let result = cache.compile_source("app.Main", USES_HELPER).unwrap();
  assert_eq!(result.names(), vec!["app.Main".to_string(), "lib.helper".to_string()]);
  cache.clear_buffer();

  cache.load_unit(&mut LuaContext::new().unwrap(), "app.Main", USES_HELPER).unwrap();
  assert!(env.path("classes/app/Main.luac").is_file());
  assert!(env.path("classes/lib/helper.luac").is_file());
}

#[test]
fn missing_directory_is_not_added() {
  let env = TestEnv::new();
  let mut cache = memory_cache();

  assert!(!cache.add_classpath_entry(env.path("nowhere")).unwrap());
  assert!(cache.classpath().is_empty());
}

#[test]
fn adding_the_same_directory_twice_is_a_no_op() {
  let env = TestEnv::new();
  let deps = env.mkdir("deps");
  let mut cache = memory_cache();

  assert!(cache.add_classpath_entry(&deps).unwrap());
  let generation = cache.registry().generation();
  assert!(cache.add_classpath_entry(deps.join(".")).unwrap());

  assert_eq!(cache.classpath().len(), 1);
  assert_eq!(cache.registry().generation(), generation);
}

#[test]
fn zip_archives_serve_as_classpath_entries() {
  let env = TestEnv::new();
  let archive = env.path("helpers.zip");
  write_zip(&archive, &[("lib/helper/init.lua", "return { value = 21 }")]);
  let mut cache = memory_cache();
  let mut context = LuaContext::new().unwrap();

  assert!(cache.add_classpath_entry(&archive).unwrap());
  assert_eq!(cache.registry().buffer().inner().open_archives(), 1);

  let unit = cache.load_unit(&mut context, "app.Main", USES_HELPER).unwrap();
  assert_eq!(unit.call::<i64>("get", ()).unwrap(), 42);

  cache.close().unwrap();
  assert_eq!(cache.registry().buffer().inner().open_archives(), 0);
}

#[test]
fn growth_discards_residue_from_unloaded_compiles() {
  let env = TestEnv::new();
  let mut cache = memory_cache();
  cache.compile_source("stale.Unit", "return 1").unwrap();
  assert!(!cache.registry().buffer().is_empty());

  cache.add_classpath_entry(env.mkdir("deps")).unwrap();
  assert!(cache.registry().buffer().is_empty());
}
