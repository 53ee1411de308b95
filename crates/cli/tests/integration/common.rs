//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const TEST_USER: &str = "test-builder";

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding release directories and
/// the update-server root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &[u8]) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Update-server root (isolated per test).
  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().join("server");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the relkit binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `RELKIT_ROOT`: Isolated server root
  /// - `RELKIT_USER`: Fixed log user
  /// - `XDG_DATA_HOME`: Isolated data path
  pub fn relkit_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("relkit");
    cmd.env("RELKIT_ROOT", self.root_path());
    cmd.env("RELKIT_USER", TEST_USER);
    cmd.env("XDG_DATA_HOME", self.temp.path().join("data"));
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Create a release directory with payload files and generate its
  /// manifests for build `build`.
  pub fn release(&self, dir: &str, build: &str, files: &[(&str, &[u8])]) -> PathBuf {
    for (name, content) in files {
      self.write_file(&format!("{}/{}", dir, name), content);
    }
    let release_dir = self.path(dir);
    self
      .relkit_cmd()
      .arg("generate")
      .arg(&release_dir)
      .args(["--build", build])
      .args(["--field", "Update-URL=http://www.example.com/updates/"])
      .args(["--component", "base"])
      .assert()
      .success();
    release_dir
  }

  pub fn install(&self, release_dir: &Path) {
    self.relkit_cmd().arg("install").arg(release_dir).assert().success();
  }
}

impl Drop for TestEnv {
  fn drop(&mut self) {
    // Archived manifests and pool objects are read-only.
    for entry in walk(self.temp.path()) {
      if let Ok(meta) = std::fs::symlink_metadata(&entry)
        && !meta.file_type().is_symlink()
      {
        let mut perms = meta.permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        let _ = std::fs::set_permissions(&entry, perms);
      }
    }
  }
}

fn walk(dir: &Path) -> Vec<PathBuf> {
  let mut paths = vec![dir.to_path_buf()];
  let mut i = 0;
  while i < paths.len() {
    let current = paths[i].clone();
    i += 1;
    if current.is_dir()
      && !current.is_symlink()
      && let Ok(entries) = std::fs::read_dir(&current)
    {
      paths.extend(entries.flatten().map(|e| e.path()));
    }
  }
  paths
}
