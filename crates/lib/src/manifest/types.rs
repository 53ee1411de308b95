//! Manifest and spec-file types.
//!
//! A manifest lists one component's installed files by content digest, size
//! and path relative to the installation root. A spec file describes one build:
//! a `Key: value` header (`Build`, `Update-URL`, ...) followed by a
//! manifest-of-manifests whose entries name `MANIFEST.{component}` files.

use std::cmp::Ordering;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BUILD_FIELD, MANIFEST_PREFIX};
use crate::util::hash::ContentHash;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
  #[error("parse error on line {line}: {message}")]
  Parse { line: usize, message: String },

  #[error("duplicate key: {key}")]
  DuplicateKey { key: String },

  #[error("spec file has no {field} field")]
  MissingField { field: String },

  #[error("invalid digest {digest:?} for {path}")]
  InvalidDigest { digest: String, path: String },

  #[error("path {path:?} leaves the installation root")]
  UnsafePath { path: String },

  #[error("{name:?} is not a component manifest name")]
  InvalidManifestName { name: String },
}

/// One payload file: digest, byte size and installed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
  pub digest: String,
  pub size: u64,
  pub relative_path: String,
}

impl ManifestEntry {
  pub fn new(digest: impl Into<String>, size: u64, relative_path: impl Into<String>) -> Self {
    Self {
      digest: digest.into(),
      size,
      relative_path: relative_path.into(),
    }
  }

  /// The entry as it appears in a manifest file, without the newline.
  pub fn to_line(&self) -> String {
    format!("{} {} {}", self.digest, self.size, self.relative_path)
  }

  /// Canonical manifest order: path first, then the whole line.
  pub fn canonical_cmp(&self, other: &Self) -> Ordering {
    self
      .relative_path
      .as_bytes()
      .cmp(other.relative_path.as_bytes())
      .then_with(|| self.to_line().cmp(&other.to_line()))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
  pub entries: Vec<ManifestEntry>,
}

impl Manifest {
  pub fn new(entries: Vec<ManifestEntry>) -> Self {
    Self { entries }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
    self.entries.iter()
  }

  /// Sort entries into canonical order.
  pub fn sort(&mut self) {
    self.entries.sort_by(ManifestEntry::canonical_cmp);
  }

  pub fn sorted(mut self) -> Self {
    self.sort();
    self
  }

  /// Check that every entry can be pooled and installed: a valid digest and a
  /// relative path that stays below the installation root.
  pub fn validate(&self) -> Result<(), ManifestError> {
    for entry in self {
      if !ContentHash::is_valid(&entry.digest) {
        return Err(ManifestError::InvalidDigest {
          digest: entry.digest.clone(),
          path: entry.relative_path.clone(),
        });
      }
      if !is_contained_path(&entry.relative_path) {
        return Err(ManifestError::UnsafePath {
          path: entry.relative_path.clone(),
        });
      }
    }
    Ok(())
  }

  /// Total payload bytes described by this manifest.
  pub fn total_size(&self) -> u64 {
    self.entries.iter().map(|e| e.size).sum()
  }
}

impl<'a> IntoIterator for &'a Manifest {
  type Item = &'a ManifestEntry;
  type IntoIter = std::slice::Iter<'a, ManifestEntry>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}

/// A parsed spec file.
///
/// Header order is kept as written so a parsed file serializes back to the
/// same text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecFile {
  pub fields: Vec<(String, String)>,
  pub manifests: Manifest,
}

impl SpecFile {
  pub fn new(fields: Vec<(String, String)>, manifests: Manifest) -> Self {
    Self { fields, manifests }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  /// The build id named by the `Build` header field.
  pub fn build_id(&self) -> Result<&str, ManifestError> {
    self.get(BUILD_FIELD).ok_or_else(|| ManifestError::MissingField {
      field: BUILD_FIELD.to_string(),
    })
  }

  /// Names of the component manifest files this spec references.
  pub fn manifest_files(&self) -> impl Iterator<Item = &str> {
    self.manifests.iter().map(|e| e.relative_path.as_str())
  }

  /// Every referenced manifest must be a `MANIFEST.*` file next to the spec.
  pub fn validate_manifest_files(&self) -> Result<(), ManifestError> {
    match self.manifest_files().find(|name| !is_manifest_file_name(name)) {
      Some(name) => Err(ManifestError::InvalidManifestName { name: name.to_string() }),
      None => Ok(()),
    }
  }
}

/// A build id names a directory under `manifests/`, so it must be a single
/// non-empty path component with no whitespace.
pub fn is_valid_build_id(build_id: &str) -> bool {
  !build_id.is_empty()
    && build_id != "."
    && build_id != ".."
    && !build_id.contains(['/', '\\'])
    && !build_id.chars().any(char::is_whitespace)
}

/// A single path component named `MANIFEST.{component}`.
pub fn is_manifest_file_name(name: &str) -> bool {
  name.len() > MANIFEST_PREFIX.len()
    && name.starts_with(MANIFEST_PREFIX)
    && !name.contains(['/', '\\'])
    && !name.chars().any(char::is_whitespace)
}

/// A relative path made only of normal components.
fn is_contained_path(path: &str) -> bool {
  !path.is_empty()
    && !path.contains('\\')
    && Path::new(path)
      .components()
      .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
