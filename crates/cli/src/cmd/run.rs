//! Implementation of the `hotchunk run` command.
//!
//! Loads a unit into a fresh Lua state (persisting artifacts when an artifact
//! root is configured) and prints either the module value or the result of
//! calling one of its exported functions.

use anyhow::{Context, Result};
use mlua::prelude::*;

use hotchunk_lib::{CacheConfig, CompilationCache, LuaContext};

use crate::output::{OutputFormat, print_json};

pub fn cmd_run(
  config: &CacheConfig,
  name: &str,
  location: &str,
  call: Option<&str>,
  args: &[String],
  format: OutputFormat,
) -> Result<()> {
  let mut cache: CompilationCache = CompilationCache::new(config).context("Failed to initialize compilation cache")?;
  let mut context = LuaContext::new().context("Failed to create Lua state")?;

  let unit = cache
    .load_from_location(&mut context, name, location)
    .with_context(|| format!("Failed to load {}", name))?;

  let value = match call {
    Some(function) => {
      let args = args
        .iter()
        .map(|arg| to_lua_arg(context.lua(), arg))
        .collect::<LuaResult<LuaMultiValue>>()?;
      unit
        .call::<LuaValue>(function, args)
        .with_context(|| format!("Failed to call {}.{}", name, function))?
    }
    None => unit.value().clone(),
  };

  if format.is_json() {
    print_json(&serde_json::to_value(&value).unwrap_or_else(|_| describe(&value).into()))?;
  } else {
    println!("{}", describe(&value));
  }

  Ok(())
}

/// Numeric-looking arguments are passed as numbers, everything else as strings.
fn to_lua_arg(lua: &Lua, arg: &str) -> LuaResult<LuaValue> {
  if let Ok(n) = arg.parse::<i64>() {
    return Ok(LuaValue::Integer(n));
  }
  if let Ok(n) = arg.parse::<f64>() {
    return Ok(LuaValue::Number(n));
  }
  Ok(LuaValue::String(lua.create_string(arg)?))
}

fn describe(value: &LuaValue) -> String {
  match value {
    LuaValue::Nil => "nil".to_string(),
    LuaValue::Boolean(b) => b.to_string(),
    LuaValue::Integer(n) => n.to_string(),
    LuaValue::Number(n) => n.to_string(),
    LuaValue::String(s) => s.to_string_lossy(),
    other => format!("<{}>", other.type_name()),
  }
}
