//! hotchunk-lib: runtime compilation cache for Lua units
//!
//! This crate turns source text produced at runtime into loaded code:
//! - `CompilationCache`: stages source, compiles it, persists changed artifacts
//!   and injects them into an execution context
//! - `ToolchainRegistry`: the live compiler, classpath resolver and capture buffer
//! - `ArtifactStore`: location reads with fallbacks, writes only when content changed
//! - `LuaContext`: a Lua state that precompiled units are injected into
//!
//! ```no_run
//! use hotchunk_lib::{CacheConfig, CompilationCache, LuaContext};
//!
//! # fn main() -> hotchunk_lib::Result<()> {
//! let mut cache: CompilationCache = CompilationCache::new(&CacheConfig::from_env())?;
//! let mut context = LuaContext::new()?;
//! let unit = cache.load_unit(&mut context, "pkg.Foo", "return { get = function() return 42 end }")?;
//! assert_eq!(unit.call::<i64>("get", ())?, 42);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod capture;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod source;
pub mod store;
pub mod toolchain;

pub use cache::{CompilationCache, CompileResult};
pub use capture::CaptureBuffer;
pub use config::CacheConfig;
pub use context::{ExecutionContext, LuaContext, LuaUnit};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{CacheError, Result};
pub use source::NamedUnit;
pub use store::ArtifactStore;
pub use toolchain::{FileManager, LuaToolchain, ModuleResolver, Toolchain, ToolchainRegistry};
