//! Classpath module lookup.
//!
//! A module `a.b` is searched as `a/b.lua` and then `a/b/init.lua` in each
//! classpath entry, in classpath order. Entries are directories or `.zip`
//! archives; archives are opened once and kept open until [`ModuleResolver::close`]
//! so repeated compiles do not re-read their central directory.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use super::{FileManager, ModuleSource};
use crate::error::{CacheError, Result};
use crate::store::paths::{BINARY_EXTENSION, SOURCE_EXTENSION, is_valid_unit_name, unit_path, unit_resource_name};

enum ClasspathEntry {
  Directory(PathBuf),
  Archive {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
  },
}

/// The standard [`FileManager`]: resolves modules from the classpath and
/// writes compiled output to an output directory on disk.
pub struct ModuleResolver {
  entries: Vec<ClasspathEntry>,
  output_dir: Option<PathBuf>,
  closed: bool,
}

impl ModuleResolver {
  /// Open every classpath entry. Missing entries are skipped.
  pub fn new(classpath: &[PathBuf], output_dir: Option<PathBuf>) -> Result<Self> {
    let mut entries = Vec::with_capacity(classpath.len());

    for path in classpath {
      if path.is_dir() {
        entries.push(ClasspathEntry::Directory(path.clone()));
      } else if path.is_file() && is_archive(path) {
        let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| CacheError::Archive {
          path: path.clone(),
          source,
        })?;
        debug!("Opened classpath archive {} ({} entries)", path.display(), archive.len());
        entries.push(ClasspathEntry::Archive {
          path: path.clone(),
          archive,
        });
      } else if path.exists() {
        warn!("Ignoring classpath entry {}: not a directory or zip archive", path.display());
      } else {
        debug!("Ignoring missing classpath entry {}", path.display());
      }
    }

    Ok(Self {
      entries,
      output_dir,
      closed: false,
    })
  }

  /// Number of usable classpath entries.
  pub fn entry_count(&self) -> usize {
    self.entries.len()
  }

  /// Number of archive handles currently held open.
  pub fn open_archives(&self) -> usize {
    self
      .entries
      .iter()
      .filter(|e| matches!(e, ClasspathEntry::Archive { .. }))
      .count()
  }

  pub fn is_closed(&self) -> bool {
    self.closed
  }
}

fn is_archive(path: &Path) -> bool {
  path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn candidates(name: &str) -> [String; 2] {
  let base = unit_resource_name(name);
  [
    format!("{}.{}", base, SOURCE_EXTENSION),
    format!("{}/init.{}", base, SOURCE_EXTENSION),
  ]
}

impl FileManager for ModuleResolver {
  fn find_module(&mut self, name: &str) -> Result<Option<ModuleSource>> {
    if self.closed {
      return Err(CacheError::Configuration("module resolver is closed".to_string()));
    }

    // Only names that map below a classpath entry can be found on the classpath.
    if !is_valid_unit_name(name) {
      debug!("Not searching classpath for {:?}", name);
      return Ok(None);
    }

    let candidates = candidates(name);
    for entry in &mut self.entries {
      for candidate in &candidates {
        match entry {
          ClasspathEntry::Directory(root) => {
            let path = root.join(candidate);
            if path.is_file() {
              let text = fs::read_to_string(&path).map_err(|e| CacheError::io(&path, e))?;
              return Ok(Some(ModuleSource {
                name: name.to_string(),
                origin: path.display().to_string(),
                text,
              }));
            }
          }
          ClasspathEntry::Archive { path, archive } => match archive.by_name(candidate) {
            Ok(mut file) => {
              let mut text = String::new();
              file.read_to_string(&mut text).map_err(|e| CacheError::io(&*path, e))?;
              return Ok(Some(ModuleSource {
                name: name.to_string(),
                origin: format!("{}!{}", path.display(), candidate),
                text,
              }));
            }
            Err(ZipError::FileNotFound) => {}
            Err(source) => {
              return Err(CacheError::Archive {
                path: path.clone(),
                source,
              });
            }
          },
        }
      }
    }

    Ok(None)
  }

  fn write_output(&mut self, binary_name: &str, bytes: Vec<u8>) -> Result<()> {
    let dir = self
      .output_dir
      .as_ref()
      .ok_or_else(|| CacheError::Configuration("no output directory configured".to_string()))?;

    let path = unit_path(dir, binary_name, BINARY_EXTENSION);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
    }
    fs::write(&path, bytes).map_err(|e| CacheError::io(&path, e))?;
    debug!("Wrote {} to {}", binary_name, path.display());
    Ok(())
  }

  fn close(&mut self) -> Result<()> {
    if !self.closed {
      debug!("Closing module resolver ({} archive handles)", self.open_archives());
      self.entries.clear();
      self.closed = true;
    }
    Ok(())
  }
}
