//! Update-server pointer management.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── manifests/<build>/release.spec   # archived, read-only
//! ├── pool/<digest>                    # see `crate::pool`
//! ├── staging.spec -> manifests/<build>/release.spec
//! ├── staging.spec.sig
//! ├── staging.log
//! ├── release.spec -> manifests/<build>/release.spec
//! ├── release.spec.sig
//! └── release.log
//! ```
//!
//! Every repoint appends a line to the pointer's log before the link is
//! swapped. Nothing here locks; two processes repointing at once can
//! interleave.

pub mod log;
pub mod pointer;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::consts::{MANIFESTS_DIR, NULL_BUILD, RELEASE_SPEC, SIG_SUFFIX};
use crate::manifest::{ManifestError, is_valid_build_id, parse_spec_file};

pub use log::{LogEntry, parse_log};
pub use pointer::Pointer;

#[derive(Debug, Error)]
pub enum ServerError {
  #[error("not found: {path}")]
  NotFound { path: PathBuf },

  #[error("log parse error on line {line}: {message}")]
  Parse { line: usize, message: String },

  #[error("invalid spec file {path}: {source}")]
  Spec {
    path: PathBuf,
    #[source]
    source: ManifestError,
  },

  #[error("invalid build id: {build_id:?}")]
  InvalidBuildId { build_id: String },

  #[error("user name {user:?} must be non-empty and contain no whitespace")]
  InvalidUser { user: String },

  #[error("permission denied: {path}")]
  PermissionDenied { path: PathBuf },

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl ServerError {
  fn io(path: &Path, source: io::Error) -> Self {
    match source.kind() {
      io::ErrorKind::NotFound => ServerError::NotFound { path: path.to_path_buf() },
      io::ErrorKind::PermissionDenied => ServerError::PermissionDenied { path: path.to_path_buf() },
      _ => ServerError::Io {
        path: path.to_path_buf(),
        source,
      },
    }
  }
}

/// Build ids both pointers currently refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
  pub staging: String,
  pub release: String,
}

#[derive(Debug, Clone)]
pub struct UpdateServer {
  root: PathBuf,
  user: String,
}

impl UpdateServer {
  pub fn new(root: PathBuf, user: impl Into<String>) -> Self {
    Self {
      root,
      user: user.into(),
    }
  }

  pub fn pointer_path(&self, pointer: Pointer) -> PathBuf {
    self.root.join(pointer.spec_file_name())
  }

  pub fn log_path(&self, pointer: Pointer) -> PathBuf {
    self.root.join(pointer.log_file_name())
  }

  /// The archived spec file for `build_id`.
  pub fn archived_spec_path(&self, build_id: &str) -> PathBuf {
    self.root.join(archived_spec_relative(build_id))
  }

  /// The spec file `pointer` currently refers to, if it exists.
  pub fn current_target(&self, pointer: Pointer) -> Result<Option<PathBuf>, ServerError> {
    let link = self.pointer_path(pointer);
    pointer::resolve(&link).map_err(|e| ServerError::io(&link, e))
  }

  /// Build id `pointer` refers to, or `<null>` if it was never set.
  pub fn current_build(&self, pointer: Pointer) -> Result<String, ServerError> {
    match self.current_target(pointer)? {
      Some(target) => read_build_id(&target),
      None => Ok(NULL_BUILD.to_string()),
    }
  }

  pub fn status(&self) -> Result<ServerStatus, ServerError> {
    Ok(ServerStatus {
      staging: self.current_build(Pointer::Staging)?,
      release: self.current_build(Pointer::Release)?,
    })
  }

  /// Repoint `pointer` at `new_spec` and log the transition.
  ///
  /// A relative `new_spec` is taken relative to the server root. The pointer
  /// and its `.sig` companion end up referring to the canonical absolute path.
  pub fn update_pointer(&self, pointer: Pointer, new_spec: &Path, notes: &str) -> Result<LogEntry, ServerError> {
    self.check_user()?;

    let new_spec = if new_spec.is_absolute() {
      new_spec.to_path_buf()
    } else {
      self.root.join(new_spec)
    };
    let target = dunce::canonicalize(&new_spec).map_err(|e| ServerError::io(&new_spec, e))?;

    let entry = LogEntry {
      before: self.previous_build(pointer)?,
      after: read_build_id(&target)?,
      user: self.user.clone(),
      time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
      notes: log::single_line(notes),
    };

    self.append_log(pointer, &entry)?;

    let link = self.pointer_path(pointer);
    pointer::repoint(&link, &target).map_err(|e| ServerError::io(&link, e))?;

    let sig_link = self.root.join(pointer.sig_file_name());
    let sig_target = append_suffix(&target, SIG_SUFFIX);
    if sig_target.exists() {
      pointer::repoint(&sig_link, &sig_target).map_err(|e| ServerError::io(&sig_link, e))?;
    } else {
      warn!(pointer = %pointer, spec = %target.display(), "new spec has no signature");
      pointer::remove(&sig_link).map_err(|e| ServerError::io(&sig_link, e))?;
    }

    info!(
      pointer = %pointer,
      before = %entry.before,
      after = %entry.after,
      user = %entry.user,
      "pointer updated"
    );
    Ok(entry)
  }

  /// Point `release` at whatever `staging` points at.
  pub fn release_from_staging(&self, notes: &str) -> Result<LogEntry, ServerError> {
    let staging = self
      .current_target(Pointer::Staging)?
      .ok_or_else(|| ServerError::NotFound {
        path: self.pointer_path(Pointer::Staging),
      })?;
    self.update_pointer(Pointer::Release, &staging, notes)
  }

  /// Point `staging` at an already archived build.
  pub fn stage(&self, build_id: &str, notes: &str) -> Result<LogEntry, ServerError> {
    if !is_valid_build_id(build_id) {
      return Err(ServerError::InvalidBuildId {
        build_id: build_id.to_string(),
      });
    }
    let spec = self.archived_spec_path(build_id);
    if !spec.is_file() {
      return Err(ServerError::NotFound { path: spec });
    }
    self.update_pointer(Pointer::Staging, &archived_spec_relative(build_id), notes)
  }

  /// All logged transitions of `pointer`, oldest first.
  pub fn read_log(&self, pointer: Pointer) -> Result<Vec<LogEntry>, ServerError> {
    let path = self.log_path(pointer);
    match fs::read_to_string(&path) {
      Ok(text) => parse_log(&text),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
      Err(e) => Err(ServerError::io(&path, e)),
    }
  }

  /// Like `current_build`, but a pointer whose target is gone counts as
  /// unset so it can be repointed.
  fn previous_build(&self, pointer: Pointer) -> Result<String, ServerError> {
    match self.current_build(pointer) {
      Err(ServerError::NotFound { path }) => {
        warn!(pointer = %pointer, path = %path.display(), "pointer target is missing");
        Ok(NULL_BUILD.to_string())
      }
      other => other,
    }
  }

  fn append_log(&self, pointer: Pointer, entry: &LogEntry) -> Result<(), ServerError> {
    let path = self.log_path(pointer);
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .map_err(|e| ServerError::io(&path, e))?;
    // One write per line keeps concurrent appends from splitting a line on
    // filesystems with atomic O_APPEND.
    file
      .write_all(entry.to_line().as_bytes())
      .map_err(|e| ServerError::io(&path, e))
  }

  fn check_user(&self) -> Result<(), ServerError> {
    if self.user.is_empty() || self.user.chars().any(char::is_whitespace) {
      return Err(ServerError::InvalidUser {
        user: self.user.clone(),
      });
    }
    Ok(())
  }
}

fn read_build_id(spec_path: &Path) -> Result<String, ServerError> {
  let text = fs::read_to_string(spec_path).map_err(|e| ServerError::io(spec_path, e))?;
  let spec = parse_spec_file(&text).map_err(|source| ServerError::Spec {
    path: spec_path.to_path_buf(),
    source,
  })?;
  spec.build_id().map(str::to_string).map_err(|source| ServerError::Spec {
    path: spec_path.to_path_buf(),
    source,
  })
}

/// `manifests/{build}/release.spec`, relative to the server root.
pub fn archived_spec_relative(build_id: &str) -> PathBuf {
  Path::new(MANIFESTS_DIR).join(build_id).join(RELEASE_SPEC)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(suffix);
  PathBuf::from(name)
}
