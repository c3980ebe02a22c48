//! Implementation of the `hotchunk compile` command.
//!
//! Compiles one unit through the cache (staging it when a source root is
//! configured) and reports the produced artifacts and diagnostics. Nothing is
//! loaded or persisted.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use hotchunk_lib::{CacheConfig, CompilationCache, Diagnostic, Severity};

use crate::output::{OutputFormat, format_bytes, print_diagnostic, print_json, print_stat, print_success};

#[derive(Serialize)]
struct CompileReport<'a> {
  unit: &'a str,
  success: bool,
  artifacts: Vec<ArtifactEntry<'a>>,
  diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct ArtifactEntry<'a> {
  name: &'a str,
  size: usize,
}

pub fn cmd_compile(config: &CacheConfig, name: &str, location: &str, format: OutputFormat) -> Result<()> {
  let mut cache: CompilationCache = CompilationCache::new(config).context("Failed to initialize compilation cache")?;

  let text = cache
    .store()
    .read_text(location)
    .with_context(|| format!("Failed to read source: {}", location))?;
  let result = cache
    .compile_source(name, &text)
    .with_context(|| format!("Failed to compile {}", name))?;
  cache.clear_buffer();

  let success = result.contains(name);

  if format.is_json() {
    print_json(&CompileReport {
      unit: name,
      success,
      artifacts: result
        .artifacts()
        .iter()
        .map(|(name, bytes)| ArtifactEntry {
          name,
          size: bytes.len(),
        })
        .collect(),
      diagnostics: result.diagnostics(),
    })?;
  } else {
    for diagnostic in result.diagnostics() {
      print_diagnostic(diagnostic);
    }
    if success {
      print_success(&format!("Compiled {}", name));
      for (binary_name, bytes) in result.artifacts() {
        print_stat(binary_name, &format_bytes(bytes.len() as u64));
      }
    }
  }

  if !success {
    let errors = result
      .diagnostics()
      .iter()
      .filter(|d| d.severity == Severity::Error)
      .count();
    bail!("Compilation of {} failed with {} error(s)", name, errors);
  }

  Ok(())
}
