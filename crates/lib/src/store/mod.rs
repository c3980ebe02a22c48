//! Artifact store: read-with-fallback and write-if-changed-with-backup.
//!
//! # Reading
//!
//! A location string is resolved by the first strategy that succeeds:
//!
//! 1. a leading `=` means the rest of the string *is* the content (no I/O)
//! 2. resource lookup of the location as given
//! 3. resource lookup with a leading `/` prepended
//! 4. a filesystem read of the location
//! 5. a filesystem read of `<location>.gz`, decompressed
//!
//! Whatever stream was found is additionally gunzipped when the location ends in `.gz`.
//!
//! # Writing
//!
//! ```text
//! <dir>/
//! ├── Foo.luac       # current content
//! └── Foo.luac.bak   # previous content, kept when Foo.luac changes
//! ```
//!
//! Identical content is never rewritten, which is what makes persisted
//! artifacts act as a cache.

pub mod paths;
pub mod resources;

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, error};

use crate::error::{CacheError, Result};
use paths::{GZIP_SUFFIX, LITERAL_MARKER, backup_path};
use resources::ResourceProvider;

/// Persistence layer for staged sources and compiled artifacts.
#[derive(Default)]
pub struct ArtifactStore {
  resources: Vec<Box<dyn ResourceProvider>>,
}

impl ArtifactStore {
  /// Create a store without resource providers (filesystem lookups only).
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a resource provider, consulted after the ones already registered.
  pub fn with_resources(mut self, provider: impl ResourceProvider + 'static) -> Self {
    self.resources.push(Box::new(provider));
    self
  }

  /// Read a location as UTF-8 text.
  pub fn read_text(&self, location: &str) -> Result<String> {
    if let Some(inline) = location.strip_prefix(LITERAL_MARKER) {
      return Ok(inline.to_string());
    }

    let bytes = self.read_bytes(location)?;
    String::from_utf8(bytes).map_err(|e| CacheError::io(location, io::Error::new(io::ErrorKind::InvalidData, e)))
  }

  /// Read a location as raw bytes.
  pub fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
    let reader = self.open(location)?;
    let mut reader: Box<dyn Read> = if location.ends_with(GZIP_SUFFIX) {
      Box::new(GzDecoder::new(reader))
    } else {
      reader
    };

    let mut bytes = Vec::new();
    reader
      .read_to_end(&mut bytes)
      .map_err(|e| CacheError::io(location, e))?;
    Ok(bytes)
  }

  fn open(&self, location: &str) -> Result<Box<dyn Read>> {
    if location.is_empty() {
      return Err(CacheError::Configuration("the location cannot be empty".to_string()));
    }
    if let Some(inline) = location.strip_prefix(LITERAL_MARKER) {
      return Ok(Box::new(io::Cursor::new(inline.as_bytes().to_vec())));
    }

    let rooted = format!("/{}", location);
    for name in [location, rooted.as_str()] {
      for provider in &self.resources {
        if let Some(reader) = provider.open(name).map_err(|e| CacheError::io(name, e))? {
          debug!("Resolved {} as resource {}", location, name);
          return Ok(reader);
        }
      }
    }

    match File::open(location) {
      Ok(file) => return Ok(Box::new(BufReader::new(file))),
      Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(CacheError::io(location, e)),
      Err(_) => {}
    }

    let compressed = format!("{}{}", location, GZIP_SUFFIX);
    match File::open(&compressed) {
      Ok(file) => {
        debug!("Resolved {} as {}", location, compressed);
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CacheError::ResourceNotFound {
        location: location.to_string(),
      }),
      Err(e) => Err(CacheError::io(compressed, e)),
    }
  }

  /// Write text to `path` if it differs from what is there. See [`ArtifactStore::write_bytes`].
  pub fn write_text(&self, path: &Path, text: &str) -> Result<bool> {
    self.write_bytes(path, text.as_bytes())
  }

  /// Write `bytes` to `path` unless the file already holds exactly these bytes.
  ///
  /// Returns whether the file changed. The previous content is kept as a
  /// `.bak` sibling; if writing fails the partial file is removed and the
  /// backup is moved back before the error is returned.
  pub fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<bool> {
    write_if_changed(path, bytes, |target, bytes| fs::write(target, bytes))
  }
}

pub(crate) fn write_if_changed<F>(path: &Path, bytes: &[u8], write: F) -> Result<bool>
where
  F: FnOnce(&Path, &[u8]) -> io::Result<()>,
{
  let parent = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  if !parent.is_dir() {
    fs::create_dir_all(parent).map_err(|e| {
      CacheError::Configuration(format!("unable to create directory {}: {}", parent.display(), e))
    })?;
  }

  let mut backup = None;
  if path.exists() {
    let existing = fs::read(path).map_err(|e| CacheError::io(path, e))?;
    if existing == bytes {
      return Ok(false);
    }
    let bak = backup_path(path);
    fs::rename(path, &bak).map_err(|e| CacheError::io(&bak, e))?;
    backup = Some(bak);
  }

  if let Err(e) = write(path, bytes) {
    error!("Unable to write {}: {}", path.display(), e);
    if let Err(cleanup) = fs::remove_file(path)
      && cleanup.kind() != io::ErrorKind::NotFound
    {
      error!("Unable to remove partial {}: {}", path.display(), cleanup);
    }
    if let Some(bak) = &backup
      && let Err(restore) = fs::rename(bak, path)
    {
      error!("Unable to restore {} from {}: {}", path.display(), bak.display(), restore);
    }
    return Err(CacheError::io(path, e));
  }

  Ok(true)
}
