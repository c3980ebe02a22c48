//! Shared helpers for library integration tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use hotchunk_lib::{CacheConfig, CompilationCache};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A unit exporting `get()`, returning 42.
pub const FOO: &str = "local M = {}\nfunction M.get() return 42 end\nreturn M\n";

/// Isolated scratch area for one test.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Write a file relative to the temp directory, creating parents.
  pub fn write_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  pub fn mkdir(&self, relative: &str) -> PathBuf {
    let path = self.path(relative);
    fs::create_dir_all(&path).unwrap();
    path
  }

  /// A cache whose staging and artifact roots live in this environment.
  pub fn persistent_cache(&self) -> CompilationCache {
    let config = CacheConfig::new()
      .with_source_root(self.mkdir("src"))
      .with_artifact_root(self.mkdir("classes"));
    CompilationCache::new(&config).unwrap()
  }
}

pub fn memory_cache() -> CompilationCache {
  CompilationCache::new(&CacheConfig::new()).unwrap()
}

/// Build a zip archive holding `files`.
pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
  let mut writer = ZipWriter::new(File::create(path).unwrap());
  for (name, content) in files {
    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap();
}
