//! Manifest and spec-file generation for a release directory.
//!
//! A release is made of components. Each component installs a set of files;
//! files installed under `{app}/` are listed in the component's manifest with
//! the prefix stripped. A component only gets a `MANIFEST.{name}` file (and an
//! entry in the spec file) when it declares that manifest as one of its own
//! installed files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::{APP_PREFIX, MANIFEST_PREFIX, RELEASE_SPEC, SIG_SUFFIX};
use crate::manifest::{Manifest, ManifestEntry, ManifestError, SpecFile};
use crate::util::hash::{HashError, hash_bytes, hash_file};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("duplicate key: {key}")]
  DuplicateKey { key: String },

  #[error(transparent)]
  Hash(#[from] HashError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("failed to walk {path}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A source file and where it gets installed, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInstall {
  pub source: PathBuf,
  pub installed: Option<String>,
}

impl FileInstall {
  pub fn new(source: impl Into<PathBuf>, installed: Option<&str>) -> Self {
    Self {
      source: source.into(),
      installed: installed.map(str::to_string),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
  pub name: String,
  pub files: Vec<FileInstall>,
}

impl Component {
  pub fn new(name: impl Into<String>, files: Vec<FileInstall>) -> Self {
    Self {
      name: name.into(),
      files,
    }
  }

  /// `MANIFEST.{name}`
  pub fn manifest_name(&self) -> String {
    format!("{}{}", MANIFEST_PREFIX, self.name)
  }

  /// Whether this component installs its own manifest file.
  pub fn includes_manifest(&self) -> bool {
    let manifest_name = self.manifest_name();
    self
      .files
      .iter()
      .any(|f| f.source.file_name().and_then(|n| n.to_str()) == Some(manifest_name.as_str()))
  }

  /// The manifest of this component's installed files.
  ///
  /// The component's own manifest file is left out: it cannot list itself.
  pub fn manifest(&self) -> Result<Manifest, BuildError> {
    let manifest_name = self.manifest_name();
    let files: Vec<FileInstall> = self
      .files
      .iter()
      .filter(|f| f.source.file_name().and_then(|n| n.to_str()) != Some(manifest_name.as_str()))
      .cloned()
      .collect();
    build_manifest(&files)
  }
}

/// Digest, size and stripped path for every file installed under `{app}/`.
pub fn build_manifest(files: &[FileInstall]) -> Result<Manifest, BuildError> {
  let mut seen = HashSet::new();
  let mut entries = Vec::new();

  for file in files {
    let Some(relative_path) = file.installed.as_deref().and_then(|p| p.strip_prefix(APP_PREFIX)) else {
      continue;
    };

    if !seen.insert(relative_path.to_string()) {
      return Err(BuildError::DuplicateKey {
        key: relative_path.to_string(),
      });
    }

    let (digest, size) = hash_file(&file.source)?;
    debug!(path = relative_path, %digest, size, "hashed file");
    entries.push(ManifestEntry::new(digest.0, size, relative_path));
  }

  Ok(Manifest::new(entries).sorted())
}

/// Bundle component manifests into a spec file.
///
/// Each manifest-of-manifests entry describes the serialized component
/// manifest itself, not a payload.
pub fn build_spec(
  fields: &[(String, String)],
  component_manifests: &BTreeMap<String, Manifest>,
) -> Result<SpecFile, BuildError> {
  let mut seen = HashSet::new();
  for (key, _) in fields {
    if !seen.insert(key.as_str()) {
      return Err(BuildError::DuplicateKey { key: key.clone() });
    }
  }

  let entries = component_manifests
    .iter()
    .map(|(name, manifest)| {
      let text = manifest.to_text();
      ManifestEntry::new(
        hash_bytes(text.as_bytes()).0,
        text.len() as u64,
        format!("{}{}", MANIFEST_PREFIX, name),
      )
    })
    .collect();

  Ok(SpecFile::new(fields.to_vec(), Manifest::new(entries).sorted()))
}

/// Manifests of every component that includes one, keyed by component name.
pub fn component_manifests(components: &[Component]) -> Result<BTreeMap<String, Manifest>, BuildError> {
  let mut manifests = BTreeMap::new();
  for component in components {
    if !component.includes_manifest() {
      debug!(component = %component.name, "component has no manifest, skipping");
      continue;
    }
    if manifests.insert(component.name.clone(), component.manifest()?).is_some() {
      return Err(BuildError::DuplicateKey {
        key: component.name.clone(),
      });
    }
  }
  Ok(manifests)
}

/// Write `MANIFEST.*` files and `release.spec` into `release_dir`.
pub fn generate_release_files(
  release_dir: &Path,
  fields: &[(String, String)],
  components: &[Component],
) -> Result<SpecFile, BuildError> {
  let manifests = component_manifests(components)?;
  let spec = build_spec(fields, &manifests)?;

  for (name, manifest) in &manifests {
    let path = release_dir.join(format!("{}{}", MANIFEST_PREFIX, name));
    write_atomic(&path, manifest.to_text().as_bytes())?;
  }
  write_atomic(&release_dir.join(RELEASE_SPEC), spec.to_text().as_bytes())?;

  info!(
    dir = %release_dir.display(),
    components = manifests.len(),
    build = spec.get(crate::consts::BUILD_FIELD).unwrap_or_default(),
    "generated release files"
  );
  Ok(spec)
}

/// Describe the files below `release_dir/subdir` as one component.
///
/// Files install at their path relative to `release_dir`. Release metadata
/// (`release.spec`, its signature, `MANIFEST.*`) is skipped, and the
/// component's own manifest is declared so it gets one.
pub fn scan_component(release_dir: &Path, name: &str, subdir: Option<&Path>) -> Result<Component, BuildError> {
  let scan_root = subdir.map(|s| release_dir.join(s)).unwrap_or_else(|| release_dir.to_path_buf());
  let mut files = Vec::new();

  for entry in WalkDir::new(&scan_root).sort_by_file_name() {
    let entry = entry.map_err(|e| BuildError::Walk {
      path: scan_root.clone(),
      source: e,
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let Ok(relative) = entry.path().strip_prefix(release_dir) else {
      continue;
    };
    let relative = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    if is_release_metadata(&relative) {
      continue;
    }

    files.push(FileInstall {
      source: entry.path().to_path_buf(),
      installed: Some(format!("{}{}", APP_PREFIX, relative)),
    });
  }

  let manifest_name = format!("{}{}", MANIFEST_PREFIX, name);
  files.push(FileInstall {
    source: release_dir.join(&manifest_name),
    installed: Some(format!("{}{}", APP_PREFIX, manifest_name)),
  });

  Ok(Component::new(name, files))
}

fn is_release_metadata(relative: &str) -> bool {
  relative == RELEASE_SPEC || relative == format!("{}{}", RELEASE_SPEC, SIG_SUFFIX) || relative.starts_with(MANIFEST_PREFIX)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), BuildError> {
  let dir = path.parent().unwrap_or_else(|| Path::new("."));
  let write_err = |source: io::Error| BuildError::Write {
    path: path.to_path_buf(),
    source,
  };

  fs::create_dir_all(dir).map_err(write_err)?;
  let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
  temp.write_all(content).map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;
  Ok(())
}
