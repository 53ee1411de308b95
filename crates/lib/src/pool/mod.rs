//! Content-addressed payload pool.
//!
//! # Layout
//!
//! ```text
//! {root}/pool/
//! ├── da39a3ee5e6b4b0d3255bfef95601890afd80709
//! └── 855426068ee8939df6bce2c2c4b1e7346532a133
//! ```
//!
//! One read-only file per digest. An object is written once and never
//! replaced; a `put` for a digest that is already present does nothing and
//! does not compare bytes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::POOL_DIR;
use crate::platform::immutable::{ImmutableError, make_immutable};
use crate::util::hash::ContentHash;

#[derive(Debug, Error)]
pub enum PoolError {
  #[error("object {digest} not found in pool")]
  NotFound { digest: String },

  #[error("source file not found: {path}")]
  SourceNotFound { path: PathBuf },

  #[error("invalid digest: {digest:?}")]
  InvalidDigest { digest: String },

  #[error("permission denied writing {path}")]
  PermissionDenied { path: PathBuf },

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Immutable(#[from] ImmutableError),
}

impl PoolError {
  fn io(path: &Path, source: io::Error) -> Self {
    if source.kind() == io::ErrorKind::PermissionDenied {
      return PoolError::PermissionDenied { path: path.to_path_buf() };
    }
    PoolError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ContentPool {
  dir: PathBuf,
}

impl ContentPool {
  /// A pool stored directly in `dir`.
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  /// The pool below an update-server root (`{root}/pool`).
  pub fn under_root(root: &Path) -> Self {
    Self::new(root.join(POOL_DIR))
  }

  /// Path where the object for `digest` lives.
  pub fn object_path(&self, digest: &str) -> Result<PathBuf, PoolError> {
    if !ContentHash::is_valid(digest) {
      return Err(PoolError::InvalidDigest {
        digest: digest.to_string(),
      });
    }
    Ok(self.dir.join(digest))
  }

  pub fn contains(&self, digest: &str) -> bool {
    self.object_path(digest).map(|p| p.exists()).unwrap_or(false)
  }

  /// Copy `source` into the pool under `digest` unless it is already there.
  ///
  /// Returns `true` when a new object was written.
  pub fn put(&self, digest: &str, source: &Path) -> Result<bool, PoolError> {
    let dest = self.object_path(digest)?;

    if dest.exists() {
      debug!(digest, "object already pooled, skipping");
      return Ok(false);
    }

    if !source.is_file() {
      return Err(PoolError::SourceNotFound {
        path: source.to_path_buf(),
      });
    }

    fs::create_dir_all(&self.dir).map_err(|e| PoolError::io(&self.dir, e))?;

    let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| PoolError::io(&self.dir, e))?;
    let mut reader = fs::File::open(source).map_err(|e| PoolError::io(source, e))?;
    io::copy(&mut reader, temp.as_file_mut()).map_err(|e| PoolError::io(temp.path(), e))?;
    temp.as_file().sync_all().map_err(|e| PoolError::io(temp.path(), e))?;

    match temp.persist_noclobber(&dest) {
      Ok(_) => {}
      Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
        debug!(digest, "object appeared while copying, keeping existing");
        return Ok(false);
      }
      Err(e) => return Err(PoolError::io(&dest, e.error)),
    }

    make_immutable(&dest)?;
    info!(digest, source = %source.display(), "added object to pool");
    Ok(true)
  }

  /// Read an object's bytes.
  pub fn get(&self, digest: &str) -> Result<Vec<u8>, PoolError> {
    let path = self.object_path(digest)?;
    fs::read(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        PoolError::NotFound {
          digest: digest.to_string(),
        }
      } else {
        PoolError::io(&path, e)
      }
    })
  }

  /// All digests currently pooled, sorted.
  pub fn digests(&self) -> Result<Vec<String>, PoolError> {
    let entries = match fs::read_dir(&self.dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(PoolError::io(&self.dir, e)),
    };

    let mut digests: Vec<String> = entries
      .flatten()
      .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
      .filter(|name| ContentHash::is_valid(name))
      .collect();
    digests.sort();
    Ok(digests)
  }
}
