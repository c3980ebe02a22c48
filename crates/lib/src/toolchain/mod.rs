//! The compiler side of hotchunk.
//!
//! A [`Toolchain`] compiles one [`NamedUnit`] at a time. Everything it needs
//! from the outside world (finding dependencies, writing compiled output) goes
//! through a [`FileManager`], which is what lets the [`crate::capture::CaptureBuffer`]
//! intercept output in memory.
//!
//! # Submodules
//!
//! - [`lua`] - Lua 5.4 bytecode compiler
//! - [`registry`] - Live toolchain state and classpath management
//! - [`resolver`] - Classpath module lookup (directories and zip archives)
//! - [`scan`] - `require` discovery in Lua source

pub mod lua;
pub mod registry;
pub mod resolver;
pub mod scan;

use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::source::NamedUnit;

pub use lua::LuaToolchain;
pub use registry::{ToolchainRegistry, ToolchainState};
pub use resolver::ModuleResolver;

/// Source of a module found on the classpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
  pub name: String,
  /// Where the module was found, e.g. a file path or `archive.zip!a/b.lua`.
  pub origin: String,
  pub text: String,
}

/// Dependency lookup and output handling used by a toolchain during a compile.
pub trait FileManager {
  /// Look up the source of a module by dotted name.
  fn find_module(&mut self, name: &str) -> Result<Option<ModuleSource>>;

  /// Persist the compiled output of a unit under its binary name.
  fn write_output(&mut self, binary_name: &str, bytes: Vec<u8>) -> Result<()>;

  /// Release held handles. The manager is unusable afterwards.
  fn close(&mut self) -> Result<()>;
}

/// An external compiler.
pub trait Toolchain: Sized {
  /// Obtain a fresh compiler handle.
  fn acquire() -> Result<Self>;

  /// Compile `unit`, writing every produced artifact through `files`.
  ///
  /// Problems with the source are returned as diagnostics rather than errors;
  /// a compile with errors writes no output.
  fn compile(&self, unit: &NamedUnit, files: &mut dyn FileManager) -> Vec<Diagnostic>;
}
