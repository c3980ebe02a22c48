//! Live toolchain state and classpath management.
//!
//! The registry owns exactly one [`ToolchainState`]: a compiler handle, the
//! classpath resolver and the capture buffer wrapping it. The three are built
//! and replaced together; growing the classpath rebuilds all of them so no
//! resolver or buffered output from before the change survives.
//!
//! Every method takes `&mut self`, so whoever holds the registry is the only
//! one compiling. The toolchain holds a Lua state, which keeps the registry on
//! the thread that created it.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{FileManager, LuaToolchain, ModuleResolver, Toolchain};
use crate::capture::CaptureBuffer;
use crate::diagnostics::Diagnostic;
use crate::error::{CacheError, Result};
use crate::source::NamedUnit;

/// Compiler handle, resolver and capture buffer, replaced as one unit.
pub struct ToolchainState<T> {
  toolchain: T,
  files: CaptureBuffer<ModuleResolver>,
}

impl<T: Toolchain> ToolchainState<T> {
  fn create(classpath: &[PathBuf]) -> Result<Self> {
    let toolchain = T::acquire()?;
    let resolver = ModuleResolver::new(classpath, None)?;
    Ok(Self {
      toolchain,
      files: CaptureBuffer::new(resolver),
    })
  }
}

pub struct ToolchainRegistry<T = LuaToolchain> {
  classpath: Vec<PathBuf>,
  state: ToolchainState<T>,
  generation: u64,
}

impl<T: Toolchain> ToolchainRegistry<T> {
  /// Build the initial state for `classpath`. Compiled output always goes to
  /// the capture buffer, never to disk.
  pub fn new(classpath: Vec<PathBuf>) -> Result<Self> {
    let classpath: Vec<PathBuf> = classpath.iter().map(|p| canonical(p).unwrap_or_else(|_| p.clone())).collect();
    let state = ToolchainState::create(&classpath)?;
    debug!("Toolchain registry created with {} classpath entries", classpath.len());
    Ok(Self {
      classpath,
      state,
      generation: 0,
    })
  }

  /// Replace the whole toolchain state with a freshly built one.
  ///
  /// The new state is built before anything is swapped, so a failure leaves
  /// the current state in place.
  pub fn reset(&mut self) -> Result<()> {
    let fresh = ToolchainState::create(&self.classpath)?;
    let mut old = std::mem::replace(&mut self.state, fresh);
    if let Err(e) = old.files.close() {
      warn!("Failed to close replaced toolchain state: {}", e);
    }
    self.generation += 1;
    debug!("Toolchain state reset (generation {})", self.generation);
    Ok(())
  }

  /// Add `path` to the classpath.
  ///
  /// Returns `false` without changing anything if the path does not exist.
  /// A path already on the classpath is accepted without a reset.
  pub fn grow_classpath(&mut self, path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("Not adding {} to classpath: path does not exist", path.display());
      return Ok(false);
    }

    let canonical = canonical(path).map_err(|e| CacheError::io(path, e))?;
    if self.classpath.contains(&canonical) {
      debug!("{} is already on the classpath", canonical.display());
      return Ok(true);
    }

    self.classpath.push(canonical);
    if let Err(e) = self.reset() {
      self.classpath.pop();
      return Err(e);
    }

    info!("Added {} to classpath", path.display());
    Ok(true)
  }

  /// The effective classpath, in search order.
  pub fn classpath(&self) -> &[PathBuf] {
    &self.classpath
  }

  /// How many times the state has been rebuilt since creation.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Compile `unit` with the current state. Output lands in the capture buffer.
  pub fn run_compilation(&mut self, unit: &NamedUnit) -> Vec<Diagnostic> {
    debug!("Compiling {} ({})", unit.name(), unit.uri());
    let diagnostics = self.state.toolchain.compile(unit, &mut self.state.files);
    for diagnostic in &diagnostics {
      diagnostic.report();
    }
    diagnostics
  }

  pub fn buffer(&self) -> &CaptureBuffer<ModuleResolver> {
    &self.state.files
  }

  pub fn buffer_mut(&mut self) -> &mut CaptureBuffer<ModuleResolver> {
    &mut self.state.files
  }

  /// Release the resolver's handles. Compiles after this report resolution errors
  /// for every non-builtin dependency until the next [`ToolchainRegistry::reset`].
  pub fn close(&mut self) -> Result<()> {
    self.state.files.close()
  }
}

fn canonical(path: &Path) -> std::io::Result<PathBuf> {
  dunce::canonicalize(path).or_else(|_| std::path::absolute(path))
}
