//! Compiler diagnostics.
//!
//! Diagnostics are reported by the toolchain alongside (never instead of) a
//! compile call. A compile that produced only diagnostics simply yields no
//! artifacts; callers find out by looking for the artifact they asked for.

use std::fmt;

use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Error,
  Warning,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Error => write!(f, "error"),
      Severity::Warning => write!(f, "warning"),
    }
  }
}

/// A single message emitted while compiling a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub severity: Severity,
  /// Name of the unit the message refers to (may be an implicitly compiled dependency).
  pub unit: String,
  pub line: Option<u32>,
  pub message: String,
}

impl Diagnostic {
  pub fn error(unit: impl Into<String>, line: Option<u32>, message: impl Into<String>) -> Self {
    Self {
      severity: Severity::Error,
      unit: unit.into(),
      line,
      message: message.into(),
    }
  }

  pub fn warning(unit: impl Into<String>, line: Option<u32>, message: impl Into<String>) -> Self {
    Self {
      severity: Severity::Warning,
      unit: unit.into(),
      line,
      message: message.into(),
    }
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }

  /// Emit this diagnostic on the tracing channel.
  pub fn report(&self) {
    match self.severity {
      Severity::Error => error!(unit = %self.unit, line = ?self.line, "{}", self.message),
      Severity::Warning => warn!(unit = %self.unit, line = ?self.line, "{}", self.message),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.line {
      Some(line) => write!(f, "{}:{}: {}: {}", self.unit, line, self.severity, self.message),
      None => write!(f, "{}: {}: {}", self.unit, self.severity, self.message),
    }
  }
}

/// Whether any diagnostic in the list is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
  diagnostics.iter().any(Diagnostic::is_error)
}
