//! Error types for hotchunk-lib.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::{Diagnostic, Severity};

/// Errors that can occur while staging, compiling, persisting or loading units.
#[derive(Debug, Error)]
pub enum CacheError {
  /// A read location could not be resolved by any lookup strategy.
  #[error("Resource not found: {location}")]
  ResourceNotFound { location: String },

  /// The compile produced no artifact under the requested name, or the
  /// execution context could not resolve it after injection.
  #[error("Unit not found: {name} ({})", describe_missing(.diagnostics, .produced))]
  UnitNotFound {
    name: String,
    diagnostics: Vec<Diagnostic>,
    produced: Vec<String>,
  },

  #[error("IO error on '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Configuration error: {0}")]
  Configuration(String),

  #[error("Invalid unit name: {0:?}")]
  InvalidUnitName(String),

  /// The execution context already defines this binary name.
  #[error("Unit already defined in execution context: {name}")]
  DuplicateUnit { name: String },

  #[error("Failed to read classpath archive '{}': {source}", path.display())]
  Archive {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("Lua error: {0}")]
  Lua(#[from] mlua::Error),
}

impl CacheError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    CacheError::Io {
      path: path.into(),
      source,
    }
  }

  /// Whether this is a missing unit caused by errors in the submitted source,
  /// as opposed to a source that compiled under different names.
  pub fn has_compile_errors(&self) -> bool {
    match self {
      CacheError::UnitNotFound { diagnostics, .. } => diagnostics.iter().any(|d| d.severity == Severity::Error),
      _ => false,
    }
  }
}

fn describe_missing(diagnostics: &[Diagnostic], produced: &[String]) -> String {
  let errors: Vec<String> = diagnostics
    .iter()
    .filter(|d| d.severity == Severity::Error)
    .map(|d| d.to_string())
    .collect();

  if !errors.is_empty() {
    format!("compilation failed: {}", errors.join("; "))
  } else if produced.is_empty() {
    "no artifacts produced".to_string()
  } else {
    format!("produced {}", produced.join(", "))
  }
}

/// Result type for hotchunk-lib operations
pub type Result<T> = std::result::Result<T, CacheError>;
