//! Named pointers to an archived spec file.
//!
//! A pointer is a symlink in the server root (`staging.spec`, `release.spec`)
//! plus an optional `.sig` companion. Repointing builds the new link under a
//! temporary name and renames it over the old one, so readers see either the
//! old target or the new one and never a missing pointer.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::SIG_SUFFIX;
use crate::platform::link::{entry_exists, symlink_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pointer {
  Staging,
  Release,
}

impl Pointer {
  pub fn as_str(&self) -> &'static str {
    match self {
      Pointer::Staging => "staging",
      Pointer::Release => "release",
    }
  }

  /// `staging.spec` / `release.spec`
  pub fn spec_file_name(&self) -> String {
    format!("{}.spec", self.as_str())
  }

  pub fn sig_file_name(&self) -> String {
    format!("{}{}", self.spec_file_name(), SIG_SUFFIX)
  }

  pub fn log_file_name(&self) -> String {
    format!("{}.log", self.as_str())
  }
}

impl fmt::Display for Pointer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Pointer {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "staging" | "staging.spec" => Ok(Pointer::Staging),
      "release" | "release.spec" => Ok(Pointer::Release),
      other => Err(format!("unknown pointer {:?} (expected staging or release)", other)),
    }
  }
}

/// Point `link` at `target`, replacing whatever it pointed at before.
pub fn repoint(link: &Path, target: &Path) -> io::Result<()> {
  let file_name = link.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  let temp_link = link.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

  if entry_exists(&temp_link) {
    fs::remove_file(&temp_link)?;
  }

  symlink_file(target, &temp_link)?;
  if let Err(e) = fs::rename(&temp_link, link) {
    let _ = fs::remove_file(&temp_link);
    return Err(e);
  }

  debug!(link = %link.display(), target = %target.display(), "repointed");
  Ok(())
}

/// Remove a pointer if it exists.
pub fn remove(link: &Path) -> io::Result<()> {
  match fs::remove_file(link) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// The file a pointer currently refers to, fully resolved.
///
/// Returns `None` when the pointer does not exist. A dangling pointer is an
/// error.
pub fn resolve(link: &Path) -> io::Result<Option<PathBuf>> {
  if !entry_exists(link) {
    return Ok(None);
  }
  dunce::canonicalize(link).map(Some)
}
