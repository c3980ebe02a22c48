//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A unit exporting `get()` and `add(a, b)`.
pub const FOO: &str = r#"
local M = {}
function M.get() return 42 end
function M.add(a, b) return a + b end
return M
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory for sources, artifacts and classpath entries.
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

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn mkdir(&self, relative_path: &str) -> PathBuf {
    let path = self.path(relative_path);
    std::fs::create_dir_all(&path).unwrap();
    path
  }

  /// Get a Command for the hotchunk binary with no `HOTCHUNK_*` overrides.
  pub fn hotchunk_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("hotchunk");
    cmd
      .current_dir(self.temp.path())
      .env_remove("HOTCHUNK_SOURCE_ROOT")
      .env_remove("HOTCHUNK_ARTIFACT_ROOT")
      .env_remove("HOTCHUNK_PATH")
      .env_remove("RUST_LOG");
    cmd
  }
}
