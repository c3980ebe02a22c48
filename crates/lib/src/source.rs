//! Named source units handed to the toolchain.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};
use crate::store::paths::{SOURCE_EXTENSION, is_valid_unit_name, unit_resource_name};

/// Where the text of a unit lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSource {
  /// Text held in memory, no filesystem involvement.
  Memory(String),
  /// Text staged on disk; read by the toolchain when it compiles.
  File(PathBuf),
}

/// A dotted unit name plus its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedUnit {
  name: String,
  source: UnitSource,
}

impl NamedUnit {
  /// Wrap in-memory text as a compilation input.
  pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Result<Self> {
    Self::new(name.into(), UnitSource::Memory(text.into()))
  }

  /// Refer to source text already staged at `path`.
  pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
    Self::new(name.into(), UnitSource::File(path.into()))
  }

  fn new(name: String, source: UnitSource) -> Result<Self> {
    if !is_valid_unit_name(&name) {
      return Err(CacheError::InvalidUnitName(name));
    }
    Ok(Self { name, source })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn source(&self) -> &UnitSource {
    &self.source
  }

  /// Address of the unit, used as the chunk name in compiler messages.
  ///
  /// In-memory units get a `string:///pkg/Foo.lua` style address, staged
  /// units the path of their file.
  pub fn uri(&self) -> String {
    match &self.source {
      UnitSource::Memory(_) => format!("string:///{}.{}", unit_resource_name(&self.name), SOURCE_EXTENSION),
      UnitSource::File(path) => path.display().to_string(),
    }
  }

  /// Staged path, if the unit lives on disk.
  pub fn path(&self) -> Option<&Path> {
    match &self.source {
      UnitSource::File(path) => Some(path),
      UnitSource::Memory(_) => None,
    }
  }

  /// The source text of the unit.
  pub fn read_text(&self) -> Result<String> {
    match &self.source {
      UnitSource::Memory(text) => Ok(text.clone()),
      UnitSource::File(path) => fs::read_to_string(path).map_err(|e| CacheError::io(path, e)),
    }
  }
}
