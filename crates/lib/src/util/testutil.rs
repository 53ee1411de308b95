//! Test utilities for relkit-lib.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::platform::immutable::make_mutable;

/// A temporary directory that restores write permissions before removal.
///
/// Pools and manifest archives are locked read-only, which would otherwise
/// stop `TempDir` from cleaning up when tests run as a regular user.
pub struct TestRoot {
  temp: TempDir,
}

impl TestRoot {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn join(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Write a file relative to the root, creating parent directories.
  pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
    let path = self.join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }
}

impl Drop for TestRoot {
  fn drop(&mut self) {
    let _ = make_mutable(self.temp.path());
  }
}

/// Whether `path` has no write permission bits set.
pub fn is_read_only(path: &Path) -> bool {
  fs::metadata(path).unwrap().permissions().readonly()
}
