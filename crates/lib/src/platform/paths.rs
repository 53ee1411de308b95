//! Location and identity defaults.
//!
//! Configuration comes from the environment, with command-line flags layered
//! on top by the binary:
//!
//! - `RELKIT_ROOT`: update-server root (`manifests/`, `pool/`, pointers, logs)
//! - `RELKIT_USER`: user name recorded in transition logs

use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
  PathBuf::from(userprofile)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
  PathBuf::from(home)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Returns the update-server root directory.
pub fn update_root() -> PathBuf {
  if let Ok(path) = std::env::var("RELKIT_ROOT") {
    return PathBuf::from(path);
  }

  data_dir().join("updates")
}

/// Returns the user name recorded in transition logs.
pub fn default_user() -> String {
  match std::env::var("RELKIT_USER") {
    Ok(user) if !user.is_empty() => user,
    _ => whoami::username(),
  }
}
