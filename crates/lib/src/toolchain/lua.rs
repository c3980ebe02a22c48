//! Lua 5.4 bytecode compiler.
//!
//! Compiling a unit means parsing its text into a function inside a private
//! Lua state (the text is never run) and dumping that function as bytecode.
//! Literal `require` targets are checked against the classpath: modules found
//! there as source are compiled along with the unit and emitted under their
//! own names, the same way a class compiler emits referenced sources it finds
//! on its source path.

use std::collections::HashSet;

use mlua::prelude::*;
use tracing::debug;

use super::scan::{RequireTarget, scan_requires};
use super::{FileManager, Toolchain};
use crate::diagnostics::{Diagnostic, has_errors};
use crate::error::Result;
use crate::source::NamedUnit;

/// A compiler backed by a dedicated Lua state.
pub struct LuaToolchain {
  lua: Lua,
}

impl LuaToolchain {
  /// Whether `name` is already provided by the Lua standard library.
  fn is_builtin(&self, name: &str) -> bool {
    self
      .lua
      .globals()
      .get::<LuaTable>("package")
      .and_then(|package| package.get::<LuaTable>("loaded"))
      .and_then(|loaded| loaded.contains_key(name))
      .unwrap_or(false)
  }
}

impl Toolchain for LuaToolchain {
  fn acquire() -> Result<Self> {
    Ok(Self { lua: Lua::new() })
  }

  fn compile(&self, unit: &NamedUnit, files: &mut dyn FileManager) -> Vec<Diagnostic> {
    let text = match unit.read_text() {
      Ok(text) => text,
      Err(e) => return vec![Diagnostic::error(unit.name(), None, e.to_string())],
    };

    let mut session = Session {
      toolchain: self,
      visited: HashSet::new(),
      outputs: Vec::new(),
      diagnostics: Vec::new(),
    };
    session.compile_text(files, unit.name(), &unit.uri(), &text);

    let Session {
      outputs,
      mut diagnostics,
      ..
    } = session;

    if has_errors(&diagnostics) {
      debug!("Compilation of {} failed, discarding {} output(s)", unit.name(), outputs.len());
      return diagnostics;
    }

    for (name, bytes) in outputs {
      if let Err(e) = files.write_output(&name, bytes) {
        diagnostics.push(Diagnostic::error(&name, None, format!("cannot write output: {}", e)));
      }
    }

    diagnostics
  }
}

/// State of one compile invocation.
struct Session<'a> {
  toolchain: &'a LuaToolchain,
  visited: HashSet<String>,
  outputs: Vec<(String, Vec<u8>)>,
  diagnostics: Vec<Diagnostic>,
}

impl Session<'_> {
  fn compile_text(&mut self, files: &mut dyn FileManager, name: &str, origin: &str, text: &str) {
    self.visited.insert(name.to_string());

    let function = match self
      .toolchain
      .lua
      .load(text)
      .set_name(format!("@{}", origin))
      .into_function()
    {
      Ok(function) => function,
      Err(e) => {
        let (line, message) = split_location(&error_message(&e));
        self.diagnostics.push(Diagnostic::error(name, line, message));
        return;
      }
    };

    for require in scan_requires(text) {
      match require.target {
        RequireTarget::Literal(dependency) => self.resolve_dependency(files, name, require.line, &dependency),
        RequireTarget::Dynamic => self.diagnostics.push(Diagnostic::warning(
          name,
          Some(require.line),
          "require without a literal module name cannot be checked at compile time",
        )),
      }
    }

    self.outputs.push((name.to_string(), function.dump(false)));
  }

  fn resolve_dependency(&mut self, files: &mut dyn FileManager, from: &str, line: u32, dependency: &str) {
    if self.visited.contains(dependency) || self.toolchain.is_builtin(dependency) {
      return;
    }

    match files.find_module(dependency) {
      Ok(Some(module)) => {
        debug!("Compiling {} (required by {}) from {}", dependency, from, module.origin);
        self.compile_text(files, dependency, &module.origin, &module.text);
      }
      Ok(None) => self.diagnostics.push(Diagnostic::error(
        from,
        Some(line),
        format!("module '{}' not found on classpath", dependency),
      )),
      Err(e) => self.diagnostics.push(Diagnostic::error(
        from,
        Some(line),
        format!("cannot resolve module '{}': {}", dependency, e),
      )),
    }
  }
}

fn error_message(error: &LuaError) -> String {
  match error {
    LuaError::SyntaxError { message, .. } => message.clone(),
    other => other.to_string(),
  }
}

/// Split a Lua message of the form `<chunk>:<line>: <text>` into line and text.
fn split_location(message: &str) -> (Option<u32>, String) {
  let bytes = message.as_bytes();
  for (i, _) in message.match_indices(':') {
    let digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || bytes.get(i + 1 + digits) != Some(&b':') {
      continue;
    }
    if let Ok(line) = message[i + 1..i + 1 + digits].parse() {
      let rest = message[i + 2 + digits..].trim();
      return (Some(line), rest.to_string());
    }
  }
  (None, message.trim().to_string())
}
