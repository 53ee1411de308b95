//! Installing a built release into an update-server root.
//!
//! An install runs three steps:
//!
//! 1. archive the spec file, its signature and every component manifest under
//!    `manifests/{build}/` and lock the directory read-only
//! 2. copy every payload file into the content pool
//! 3. point `staging.spec` at the archived spec file
//!
//! Each step can also be run on its own. The spec file and manifests are
//! parsed and checked when the installer is created (digests, payload paths
//! confined to the release, manifest names confined to the archive), so a
//! malformed release fails before anything is written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{MANIFESTS_DIR, RELEASE_SPEC, SIG_SUFFIX};
use crate::manifest::{Manifest, ManifestError, is_valid_build_id, parse_manifest, parse_spec_file};
use crate::platform::immutable::{ImmutableError, make_immutable};
use crate::pool::{ContentPool, PoolError};
use crate::server::{LogEntry, Pointer, ServerError, UpdateServer, archived_spec_relative};

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("invalid manifest {path}: {source}")]
  Manifest {
    path: PathBuf,
    #[source]
    source: ManifestError,
  },

  #[error("not found: {path}")]
  NotFound { path: PathBuf },

  #[error("permission denied: {path}")]
  PermissionDenied { path: PathBuf },

  #[error("invalid build id: {build_id:?}")]
  InvalidBuildId { build_id: String },

  #[error(transparent)]
  Pool(#[from] PoolError),

  #[error(transparent)]
  Server(#[from] ServerError),

  #[error(transparent)]
  Immutable(#[from] ImmutableError),

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl InstallError {
  /// The build's manifest directory is already archived and locked.
  pub fn is_already_installed(&self) -> bool {
    matches!(self, InstallError::PermissionDenied { .. })
  }

  fn io(path: &Path, source: io::Error) -> Self {
    match source.kind() {
      io::ErrorKind::NotFound => InstallError::NotFound { path: path.to_path_buf() },
      io::ErrorKind::PermissionDenied => InstallError::PermissionDenied { path: path.to_path_buf() },
      _ => InstallError::Io {
        path: path.to_path_buf(),
        source,
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallState {
  Created,
  ManifestDirBuilt,
  PoolPopulated,
  Installed,
}

#[derive(Debug)]
pub struct ReleaseInstaller {
  source: PathBuf,
  dest: PathBuf,
  user: String,
  build_id: String,
  manifests: Vec<(String, Manifest)>,
  state: InstallState,
}

impl ReleaseInstaller {
  /// Read the release in `source` for installation into the server root
  /// `dest`. Log entries are attributed to `user`.
  pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>, user: impl Into<String>) -> Result<Self, InstallError> {
    let source = source.into();

    let spec_path = source.join(RELEASE_SPEC);
    let spec = parse_spec_file(&read_text(&spec_path)?).map_err(|e| InstallError::Manifest {
      path: spec_path.clone(),
      source: e,
    })?;

    let build_id = spec
      .build_id()
      .map_err(|e| InstallError::Manifest {
        path: spec_path.clone(),
        source: e,
      })?
      .to_string();
    if !is_valid_build_id(&build_id) {
      return Err(InstallError::InvalidBuildId { build_id });
    }
    spec.validate_manifest_files().map_err(|e| InstallError::Manifest {
      path: spec_path.clone(),
      source: e,
    })?;

    let mut manifests = Vec::new();
    for name in spec.manifest_files() {
      let path = source.join(name);
      let manifest = parse_manifest(&read_text(&path)?)
        .and_then(|manifest| manifest.validate().map(|()| manifest))
        .map_err(|e| InstallError::Manifest {
          path: path.clone(),
          source: e,
        })?;
      debug!(manifest = name, entries = manifest.len(), "read component manifest");
      manifests.push((name.to_string(), manifest));
    }

    Ok(Self {
      source,
      dest: dest.into(),
      user: user.into(),
      build_id,
      manifests,
      state: InstallState::Created,
    })
  }

  pub fn state(&self) -> InstallState {
    self.state
  }

  pub fn build_id(&self) -> &str {
    &self.build_id
  }

  /// `{dest}/manifests/{build}`
  pub fn manifest_dir(&self) -> PathBuf {
    self.dest.join(MANIFESTS_DIR).join(&self.build_id)
  }

  /// Every payload file of every component, in canonical order.
  pub fn full_manifest(&self) -> Manifest {
    let entries = self
      .manifests
      .iter()
      .flat_map(|(_, manifest)| manifest.iter().cloned())
      .collect();
    Manifest::new(entries).sorted()
  }

  /// Archive the spec file, its signature and the component manifests.
  ///
  /// Fails with `PermissionDenied` when the build was archived before.
  pub fn build_manifest_dir(&mut self) -> Result<(), InstallError> {
    let dir = self.manifest_dir();
    fs::create_dir_all(&dir).map_err(|e| InstallError::io(&dir, e))?;

    let mut names: Vec<String> = self.manifests.iter().map(|(name, _)| name.clone()).collect();
    names.push(RELEASE_SPEC.to_string());
    let sig_name = format!("{}{}", RELEASE_SPEC, SIG_SUFFIX);
    if self.source.join(&sig_name).is_file() {
      names.push(sig_name);
    }

    for name in &names {
      let from = self.source.join(name);
      let to = dir.join(name);
      if let Ok(meta) = fs::metadata(&to)
        && meta.permissions().readonly()
      {
        return Err(InstallError::PermissionDenied { path: to });
      }
      fs::copy(&from, &to).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound if !from.exists() => InstallError::NotFound { path: from.clone() },
        _ => InstallError::io(&to, e),
      })?;
      debug!(file = %name, "archived");
    }

    make_immutable(&dir)?;
    self.state = InstallState::ManifestDirBuilt;
    info!(build = %self.build_id, dir = %dir.display(), files = names.len(), "built manifest directory");
    Ok(())
  }

  /// Copy every payload into the pool. Returns how many objects were new.
  pub fn populate_pool(&mut self) -> Result<usize, InstallError> {
    let pool = ContentPool::under_root(&self.dest);
    let manifest = self.full_manifest();
    let mut added = 0;

    for entry in &manifest {
      let payload = self.source.join(&entry.relative_path);
      let inserted = pool.put(&entry.digest, &payload).map_err(|e| match e {
        PoolError::SourceNotFound { path } => InstallError::NotFound { path },
        other => InstallError::Pool(other),
      })?;
      if inserted {
        added += 1;
      }
    }

    self.state = InstallState::PoolPopulated;
    info!(
      build = %self.build_id,
      files = manifest.len(),
      added,
      "populated pool"
    );
    Ok(added)
  }

  /// Point `staging.spec` at the archived spec file.
  pub fn symlink_staging_spec(&mut self) -> Result<LogEntry, InstallError> {
    let server = UpdateServer::new(self.dest.clone(), self.user.clone());
    let entry = server.update_pointer(Pointer::Staging, &archived_spec_relative(&self.build_id), "")?;
    self.state = InstallState::Installed;
    Ok(entry)
  }

  /// Run all three install steps in order.
  pub fn build_update_installer(&mut self) -> Result<LogEntry, InstallError> {
    self.build_manifest_dir()?;
    self.populate_pool()?;
    self.symlink_staging_spec()
  }
}

fn read_text(path: &Path) -> Result<String, InstallError> {
  fs::read_to_string(path).map_err(|e| InstallError::io(path, e))
}
