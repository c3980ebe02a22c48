//! The compilation cache: stage, compile, persist, inject.
//!
//! [`CompilationCache`] ties the other components together. A load goes
//! through these steps, all on the calling thread:
//!
//! 1. stage the source text (on disk under `source_root`, or in memory)
//! 2. compile it through the [`ToolchainRegistry`]; output lands in the capture buffer
//! 3. snapshot the buffer as the [`CompileResult`]
//! 4. persist each artifact under `artifact_root` if it changed
//! 5. inject each artifact into the caller's [`ExecutionContext`]
//! 6. clear the buffer and resolve the requested unit
//!
//! The cache owns the registry, so `&mut self` on every operation is what
//! serializes loads. Like the registry, a cache stays on the thread that
//! created it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::context::ExecutionContext;
use crate::diagnostics::{Diagnostic, has_errors};
use crate::error::{CacheError, Result};
use crate::source::NamedUnit;
use crate::store::ArtifactStore;
use crate::store::paths::{BINARY_EXTENSION, SOURCE_EXTENSION, unit_path};
use crate::store::resources::DirectoryResources;
use crate::toolchain::{LuaToolchain, Toolchain, ToolchainRegistry};

/// Everything one compile produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
  unit: String,
  artifacts: BTreeMap<String, Vec<u8>>,
  diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
  /// Name of the unit that was submitted.
  pub fn unit(&self) -> &str {
    &self.unit
  }

  pub fn artifacts(&self) -> &BTreeMap<String, Vec<u8>> {
    &self.artifacts
  }

  pub fn artifact(&self, binary_name: &str) -> Option<&[u8]> {
    self.artifacts.get(binary_name).map(Vec::as_slice)
  }

  pub fn contains(&self, binary_name: &str) -> bool {
    self.artifacts.contains_key(binary_name)
  }

  pub fn names(&self) -> Vec<String> {
    self.artifacts.keys().cloned().collect()
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn has_errors(&self) -> bool {
    has_errors(&self.diagnostics)
  }

  fn into_missing(self) -> CacheError {
    let produced = self.names();
    CacheError::UnitNotFound {
      name: self.unit,
      diagnostics: self.diagnostics,
      produced,
    }
  }
}

pub struct CompilationCache<T = LuaToolchain> {
  registry: ToolchainRegistry<T>,
  store: ArtifactStore,
  source_root: Option<PathBuf>,
  artifact_root: Option<PathBuf>,
}

impl<T: Toolchain> CompilationCache<T> {
  pub fn new(config: &CacheConfig) -> Result<Self> {
    let registry = ToolchainRegistry::new(config.classpath.clone())?;

    let mut store = ArtifactStore::new();
    if !config.resource_roots.is_empty() {
      store = store.with_resources(DirectoryResources::new(config.resource_roots.clone()));
    }

    Ok(Self {
      registry,
      store,
      source_root: config.source_root.clone(),
      artifact_root: config.artifact_root.clone(),
    })
  }

  /// Replace the artifact store, e.g. to add embedded resources.
  pub fn with_store(mut self, store: ArtifactStore) -> Self {
    self.store = store;
    self
  }

  /// Compile `text` as unit `name` without loading it anywhere.
  ///
  /// The capture buffer is left as is; [`CompilationCache::load_unit`] or
  /// [`CompilationCache::clear_buffer`] empties it.
  pub fn compile_source(&mut self, name: &str, text: &str) -> Result<CompileResult> {
    let unit = match &self.source_root {
      Some(root) => {
        let path = unit_path(root, name, SOURCE_EXTENSION);
        let unit = NamedUnit::from_file(name, &path)?;
        if self.store.write_text(&path, text)? {
          debug!("Staged {} at {}", name, path.display());
        }
        unit
      }
      None => NamedUnit::from_text(name, text)?,
    };

    let diagnostics = self.registry.run_compilation(&unit);
    Ok(CompileResult {
      unit: name.to_string(),
      artifacts: self.registry.buffer().snapshot(),
      diagnostics,
    })
  }

  /// Compile `text` and make unit `name` available in `context`.
  ///
  /// Fails with [`CacheError::UnitNotFound`] when the compile did not produce
  /// `name`; [`CacheError::has_compile_errors`] tells whether that was caused by
  /// errors in the source.
  pub fn load_unit<C: ExecutionContext>(&mut self, context: &mut C, name: &str, text: &str) -> Result<C::Handle> {
    let installed = self.install(context, name, text);
    self.registry.buffer_mut().clear();
    installed?;
    context.resolve(name)
  }

  /// Read unit source from `location` (see [`ArtifactStore::read_text`]) and load it.
  pub fn load_from_location<C: ExecutionContext>(
    &mut self,
    context: &mut C,
    name: &str,
    location: &str,
  ) -> Result<C::Handle> {
    let text = self.store.read_text(location)?;
    self.load_unit(context, name, &text)
  }

  fn install<C: ExecutionContext>(&mut self, context: &mut C, name: &str, text: &str) -> Result<()> {
    let result = self.compile_source(name, text)?;
    if !result.contains(name) {
      return Err(result.into_missing());
    }

    if let Some(root) = self.persistence_root() {
      for (binary_name, bytes) in result.artifacts() {
        let path = unit_path(root, binary_name, BINARY_EXTENSION);
        if self.store.write_bytes(&path, bytes)? {
          info!("Updated {} in {}", binary_name, root.display());
        } else {
          debug!("{} unchanged in {}", binary_name, root.display());
        }
      }
    }

    let byproducts = result.artifacts().iter().filter(|(binary_name, _)| *binary_name != name);
    context.inject(name, &result.artifacts()[name])?;
    for (binary_name, bytes) in byproducts {
      if context.is_defined(binary_name) {
        debug!("{} already defined in context, not injecting again", binary_name);
        continue;
      }
      context.inject(binary_name, bytes)?;
    }

    Ok(())
  }

  /// The artifact root, if it is configured and present on disk.
  fn persistence_root(&self) -> Option<&Path> {
    let root = self.artifact_root.as_deref()?;
    if root.is_dir() {
      Some(root)
    } else {
      debug!("Artifact root {} does not exist, not persisting", root.display());
      None
    }
  }

  /// Drop anything captured by [`CompilationCache::compile_source`].
  pub fn clear_buffer(&mut self) {
    self.registry.buffer_mut().clear();
  }

  /// Add a directory or archive to the classpath. See [`ToolchainRegistry::grow_classpath`].
  pub fn add_classpath_entry(&mut self, path: impl AsRef<Path>) -> Result<bool> {
    self.registry.grow_classpath(path)
  }

  pub fn classpath(&self) -> &[PathBuf] {
    self.registry.classpath()
  }

  pub fn registry(&self) -> &ToolchainRegistry<T> {
    &self.registry
  }

  pub fn registry_mut(&mut self) -> &mut ToolchainRegistry<T> {
    &mut self.registry
  }

  pub fn store(&self) -> &ArtifactStore {
    &self.store
  }

  pub fn source_root(&self) -> Option<&Path> {
    self.source_root.as_deref()
  }

  pub fn artifact_root(&self) -> Option<&Path> {
    self.artifact_root.as_deref()
  }

  /// Release classpath handles held by the toolchain state.
  pub fn close(&mut self) -> Result<()> {
    self.registry.close()
  }
}
