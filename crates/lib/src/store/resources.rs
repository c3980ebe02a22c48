//! Classpath-style resource lookup used by the artifact store.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Resolves a resource name to a readable stream.
///
/// Returns `Ok(None)` when the provider does not know the name; errors are
/// reserved for resources that exist but cannot be opened.
pub trait ResourceProvider {
  fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read>>>;
}

/// Resources looked up below a list of root directories, first match wins.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResources {
  roots: Vec<PathBuf>,
}

impl DirectoryResources {
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self { roots }
  }

  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }
}

impl ResourceProvider for DirectoryResources {
  fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read>>> {
    let relative = Path::new(name);
    // Only plain relative names are resources; anything else would escape the roots.
    if name.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
      return Ok(None);
    }

    for root in &self.roots {
      let candidate = root.join(relative);
      if candidate.is_file() {
        let file = File::open(&candidate)?;
        return Ok(Some(Box::new(BufReader::new(file))));
      }
    }

    Ok(None)
  }
}

/// In-memory resources keyed by their literal name.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
  entries: HashMap<String, Vec<u8>>,
}

impl EmbeddedResources {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
    self.entries.insert(name.into(), content.into());
  }

  pub fn with(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
    self.insert(name, content);
    self
  }
}

impl ResourceProvider for EmbeddedResources {
  fn open(&self, name: &str) -> io::Result<Option<Box<dyn Read>>> {
    Ok(
      self
        .entries
        .get(name)
        .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read>),
    )
  }
}
