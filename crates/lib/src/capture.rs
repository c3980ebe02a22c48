//! In-memory capture of compiler output.
//!
//! [`CaptureBuffer`] wraps the toolchain's standard [`FileManager`]. Module
//! lookups and `close` go to the wrapped manager; compiled output is kept in
//! memory keyed by binary name instead of being written to disk.
//!
//! The buffer accumulates across compiles until [`CaptureBuffer::clear`] is
//! called, so one consumer must take a snapshot and clear it after each compile.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::toolchain::{FileManager, ModuleSource};

pub struct CaptureBuffer<F> {
  inner: F,
  buffers: BTreeMap<String, Vec<u8>>,
}

impl<F: FileManager> CaptureBuffer<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      buffers: BTreeMap::new(),
    }
  }

  /// Everything captured since the last clear.
  pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
    self.buffers.clone()
  }

  pub fn clear(&mut self) {
    if !self.buffers.is_empty() {
      debug!("Clearing {} captured artifact(s)", self.buffers.len());
    }
    self.buffers.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.buffers.is_empty()
  }

  pub fn len(&self) -> usize {
    self.buffers.len()
  }

  /// The wrapped file manager.
  pub fn inner(&self) -> &F {
    &self.inner
  }
}

impl<F: FileManager> FileManager for CaptureBuffer<F> {
  fn find_module(&mut self, name: &str) -> Result<Option<ModuleSource>> {
    self.inner.find_module(name)
  }

  fn write_output(&mut self, binary_name: &str, bytes: Vec<u8>) -> Result<()> {
    debug!("Captured {} ({} bytes)", binary_name, bytes.len());
    self.buffers.insert(binary_name.to_string(), bytes);
    Ok(())
  }

  fn close(&mut self) -> Result<()> {
    self.inner.close()
  }
}
