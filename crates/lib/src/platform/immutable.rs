//! Read-only lock-down of archived manifests and pool objects.
//!
//! Once a build's manifest directory or a pool object is written it is made
//! write-protected so a later install cannot silently modify it.
//!
//! ## Platform Behavior
//!
//! - **Unix**: Sets permissions to 0444 (files) or 0555 (dirs/executables)
//! - **Windows**: Toggles the read-only attribute

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Error during immutability operations.
#[derive(Debug, thiserror::Error)]
pub enum ImmutableError {
  #[error("failed to set permissions on {path}: {source}")]
  SetPermissions {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read metadata for {path}: {source}")]
  Metadata {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to traverse directory {path}: {source}")]
  WalkDir {
    path: String,
    #[source]
    source: walkdir::Error,
  },
}

/// Make a path and everything below it read-only.
///
/// Entries are processed deepest first so a directory is only locked after
/// its contents. Failures on individual entries are logged and skipped.
pub fn make_immutable(path: &Path) -> Result<(), ImmutableError> {
  if !path.exists() {
    return Ok(());
  }

  debug!(path = ?path, "making path immutable");

  for entry in WalkDir::new(path).contents_first(true) {
    let entry = entry.map_err(|e| ImmutableError::WalkDir {
      path: path.display().to_string(),
      source: e,
    })?;

    if let Err(e) = set_entry_writable(entry.path(), false) {
      warn!(path = ?entry.path(), error = %e, "failed to make immutable, continuing");
    }
  }

  Ok(())
}

/// Restore write permissions below `path`.
///
/// Directories are processed before their contents so they can be entered.
pub fn make_mutable(path: &Path) -> Result<(), ImmutableError> {
  if !path.exists() {
    return Ok(());
  }

  debug!(path = ?path, "making path mutable");

  for entry in WalkDir::new(path) {
    let entry = entry.map_err(|e| ImmutableError::WalkDir {
      path: path.display().to_string(),
      source: e,
    })?;

    if let Err(e) = set_entry_writable(entry.path(), true) {
      warn!(path = ?entry.path(), error = %e, "failed to make mutable, continuing");
    }
  }

  Ok(())
}

#[cfg(unix)]
fn set_entry_writable(path: &Path, writable: bool) -> Result<(), ImmutableError> {
  use std::os::unix::fs::PermissionsExt;

  // Symlinks carry no meaningful mode; chmod would follow them.
  let link_meta = std::fs::symlink_metadata(path).map_err(|e| ImmutableError::Metadata {
    path: path.display().to_string(),
    source: e,
  })?;
  if link_meta.file_type().is_symlink() {
    return Ok(());
  }

  let current_mode = link_meta.permissions().mode();
  let executable = link_meta.is_dir() || (current_mode & 0o111 != 0);

  let new_mode = match (writable, executable) {
    (false, true) => 0o555,
    (false, false) => 0o444,
    (true, true) => 0o755,
    (true, false) => 0o644,
  };

  let mut perms = link_meta.permissions();
  perms.set_mode(new_mode);
  std::fs::set_permissions(path, perms).map_err(|e| ImmutableError::SetPermissions {
    path: path.display().to_string(),
    source: e,
  })
}

#[cfg(not(unix))]
fn set_entry_writable(path: &Path, writable: bool) -> Result<(), ImmutableError> {
  let metadata = std::fs::symlink_metadata(path).map_err(|e| ImmutableError::Metadata {
    path: path.display().to_string(),
    source: e,
  })?;
  if metadata.file_type().is_symlink() {
    return Ok(());
  }

  let mut perms = metadata.permissions();
  perms.set_readonly(!writable);
  std::fs::set_permissions(path, perms).map_err(|e| ImmutableError::SetPermissions {
    path: path.display().to_string(),
    source: e,
  })
}
