//! Execution contexts that compiled artifacts are injected into.
//!
//! [`LuaContext`] registers bytecode in `package.preload`, so an injected unit
//! becomes reachable through the ordinary `require` path without ever touching
//! `package.path` or the filesystem.

use mlua::prelude::*;
use mlua::{ChunkMode, LuaOptions, StdLib};
use tracing::debug;

use crate::error::{CacheError, Result};

/// A runtime that accepts already-compiled units.
pub trait ExecutionContext {
  /// What [`ExecutionContext::resolve`] hands back for a loaded unit.
  type Handle;

  /// Register compiled bytes under `binary_name`.
  ///
  /// Fails with [`CacheError::DuplicateUnit`] if the name is already defined.
  fn inject(&mut self, binary_name: &str, bytes: &[u8]) -> Result<()>;

  /// Whether `binary_name` is already injected or loaded.
  fn is_defined(&self, binary_name: &str) -> bool;

  /// Look up a previously injected unit.
  fn resolve(&mut self, name: &str) -> Result<Self::Handle>;
}

/// A Lua state that can load precompiled chunks.
pub struct LuaContext {
  lua: Lua,
}

impl LuaContext {
  pub fn new() -> Result<Self> {
    // SAFETY: the debug library stays out of the state; the only unsafe capability
    // enabled is loading binary chunks, and those come from our own compiler.
    let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL_SAFE, LuaOptions::new()) };
    Ok(Self { lua })
  }

  /// The underlying Lua state, e.g. to install globals before loading units.
  pub fn lua(&self) -> &Lua {
    &self.lua
  }

  fn package_table(&self, field: &str) -> LuaResult<LuaTable> {
    self.lua.globals().get::<LuaTable>("package")?.get::<LuaTable>(field)
  }
}

impl ExecutionContext for LuaContext {
  type Handle = LuaUnit;

  fn inject(&mut self, binary_name: &str, bytes: &[u8]) -> Result<()> {
    if self.is_defined(binary_name) {
      return Err(CacheError::DuplicateUnit {
        name: binary_name.to_string(),
      });
    }

    let loader = self
      .lua
      .load(bytes)
      .set_name(format!("={}", binary_name))
      .set_mode(ChunkMode::Binary)
      .into_function()?;
    self.package_table("preload")?.set(binary_name, loader)?;

    debug!("Injected {} ({} bytes)", binary_name, bytes.len());
    Ok(())
  }

  fn is_defined(&self, binary_name: &str) -> bool {
    let defined_in = |field: &str| {
      self
        .package_table(field)
        .and_then(|table| table.contains_key(binary_name))
        .unwrap_or(false)
    };
    defined_in("preload") || defined_in("loaded")
  }

  fn resolve(&mut self, name: &str) -> Result<LuaUnit> {
    if !self.is_defined(name) {
      return Err(CacheError::UnitNotFound {
        name: name.to_string(),
        diagnostics: Vec::new(),
        produced: Vec::new(),
      });
    }

    let require: LuaFunction = self.lua.globals().get("require")?;
    let value: LuaValue = require.call(name)?;
    Ok(LuaUnit {
      name: name.to_string(),
      value,
    })
  }
}

/// A unit loaded into a [`LuaContext`]: whatever its chunk returned.
#[derive(Debug, Clone)]
pub struct LuaUnit {
  name: String,
  value: LuaValue,
}

impl LuaUnit {
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The module value, usually a table of exported functions.
  pub fn value(&self) -> &LuaValue {
    &self.value
  }

  /// Call the exported function `function` of this unit.
  ///
  /// A unit whose chunk returned a bare function is called directly when
  /// `function` is empty.
  pub fn call<R: FromLuaMulti>(&self, function: &str, args: impl IntoLuaMulti) -> Result<R> {
    let callee: LuaFunction = match &self.value {
      LuaValue::Table(exports) => exports.get(function)?,
      LuaValue::Function(f) if function.is_empty() => f.clone(),
      other => {
        return Err(CacheError::Lua(LuaError::runtime(format!(
          "unit '{}' returned a {}, which has no function '{}'",
          self.name,
          other.type_name(),
          function
        ))));
      }
    };
    Ok(callee.call(args)?)
  }
}
