//! Cache configuration.
//!
//! A [`CacheConfig`] can be built in code, read from a TOML file, or taken
//! from the environment:
//!
//! ```toml
//! source_root = "build/src"
//! artifact_root = "build/classes"
//! classpath = ["lib", "vendor/json.zip"]
//! resource_roots = ["templates"]
//! ```
//!
//! Environment variables override file values: `HOTCHUNK_SOURCE_ROOT`,
//! `HOTCHUNK_ARTIFACT_ROOT`, and `HOTCHUNK_PATH` (a platform path list whose
//! entries are appended to the classpath).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CacheError, Result};

pub const SOURCE_ROOT_ENV: &str = "HOTCHUNK_SOURCE_ROOT";
pub const ARTIFACT_ROOT_ENV: &str = "HOTCHUNK_ARTIFACT_ROOT";
pub const CLASSPATH_ENV: &str = "HOTCHUNK_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
  /// Where submitted source is staged before compiling. In memory when unset.
  pub source_root: Option<PathBuf>,
  /// Where compiled artifacts are persisted. Not persisted when unset.
  pub artifact_root: Option<PathBuf>,
  /// Initial classpath: directories and `.zip` archives holding Lua modules.
  pub classpath: Vec<PathBuf>,
  /// Roots searched by resource-style location lookups.
  pub resource_roots: Vec<PathBuf>,
}

impl CacheConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Read a TOML config file. Relative paths in it are resolved against the
  /// file's directory.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CacheError::io(path, e))?;
    let config = Self::from_toml_str(&text)
      .map_err(|e| CacheError::Configuration(format!("{}: {}", path.display(), e)))?;

    match path.parent() {
      Some(base) if !base.as_os_str().is_empty() => Ok(config.relative_to(base)),
      _ => Ok(config),
    }
  }

  pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
    toml::from_str(text)
  }

  /// Configuration from the environment alone.
  pub fn from_env() -> Self {
    Self::default().with_env_overrides()
  }

  /// Apply `HOTCHUNK_*` environment variables on top of this config.
  pub fn with_env_overrides(mut self) -> Self {
    if let Some(root) = env_path(SOURCE_ROOT_ENV) {
      self.source_root = Some(root);
    }
    if let Some(root) = env_path(ARTIFACT_ROOT_ENV) {
      self.artifact_root = Some(root);
    }
    if let Some(paths) = std::env::var_os(CLASSPATH_ENV) {
      self
        .classpath
        .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
    }
    self
  }

  pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.source_root = Some(root.into());
    self
  }

  pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.artifact_root = Some(root.into());
    self
  }

  pub fn with_classpath_entry(mut self, entry: impl Into<PathBuf>) -> Self {
    self.classpath.push(entry.into());
    self
  }

  pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.resource_roots.push(root.into());
    self
  }

  fn relative_to(self, base: &Path) -> Self {
    let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
    Self {
      source_root: self.source_root.map(join),
      artifact_root: self.artifact_root.map(join),
      classpath: self.classpath.into_iter().map(join).collect(),
      resource_roots: self.resource_roots.into_iter().map(join).collect(),
    }
  }
}

fn env_path(name: &str) -> Option<PathBuf> {
  std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}
