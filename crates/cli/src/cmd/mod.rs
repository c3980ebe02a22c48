mod compile;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hotchunk_lib::CacheConfig;
use tracing::debug;

pub use compile::cmd_compile;
pub use run::cmd_run;

/// Options shared by every command that builds a compilation cache.
///
/// Precedence, lowest first: config file, `HOTCHUNK_*` environment, flags.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
  /// Path to a TOML config file
  #[arg(long, global = true, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Stage submitted source under this directory
  #[arg(long, global = true, value_name = "DIR")]
  pub source_root: Option<PathBuf>,

  /// Persist compiled artifacts under this directory
  #[arg(long, global = true, value_name = "DIR")]
  pub artifact_root: Option<PathBuf>,

  /// Add a directory or .zip archive to the classpath (repeatable)
  #[arg(long = "classpath", global = true, value_name = "PATH")]
  pub classpath: Vec<PathBuf>,
}

impl ConfigArgs {
  pub fn resolve(&self) -> Result<CacheConfig> {
    let base = match &self.config {
      Some(path) => CacheConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
      None => CacheConfig::new(),
    };

    let mut config = base.with_env_overrides();
    if let Some(root) = &self.source_root {
      config = config.with_source_root(root);
    }
    if let Some(root) = &self.artifact_root {
      config = config.with_artifact_root(root);
    }
    for entry in &self.classpath {
      config = config.with_classpath_entry(entry);
    }
    debug!(?config, "Resolved configuration");
    Ok(config)
  }
}
