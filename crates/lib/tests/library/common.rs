//! Shared fixtures for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use relkit_lib::builder::{generate_release_files, scan_component};
use relkit_lib::install::ReleaseInstaller;
use relkit_lib::platform::immutable::make_mutable;
use tempfile::TempDir;

pub const NULL_HASH: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
pub const FOO_HASH: &str = "855426068ee8939df6bce2c2c4b1e7346532a133";
pub const BUILDER: &str = "test-builder";

/// A scratch area holding release directories and a server root.
pub struct Workspace {
  temp: TempDir,
}

impl Workspace {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// The update-server root.
  pub fn server_root(&self) -> PathBuf {
    self.temp.path().join("server")
  }

  /// Write a release directory with components `base` (top-level files) and
  /// `sub` (files under `sub/`), a detached signature, and generated
  /// manifests and spec file.
  pub fn release(&self, build: &str, base_files: &[(&str, &[u8])], sub_files: &[(&str, &[u8])]) -> PathBuf {
    let dir = self.temp.path().join(format!("release-{}", build));
    fs::create_dir_all(dir.join("sub")).unwrap();
    for (name, content) in base_files {
      fs::write(dir.join(name), content).unwrap();
    }
    for (name, content) in sub_files {
      fs::write(dir.join("sub").join(name), content).unwrap();
    }

    let mut base = scan_component(&dir, "base", None).unwrap();
    base.files.retain(|f| !f.source.starts_with(dir.join("sub")));
    let sub = scan_component(&dir, "sub", Some(Path::new("sub"))).unwrap();

    let fields = vec![
      ("Update-URL".to_string(), "http://www.example.com/updates/".to_string()),
      ("Build".to_string(), build.to_string()),
    ];
    generate_release_files(&dir, &fields, &[base, sub]).unwrap();
    fs::write(dir.join("release.spec.sig"), format!("signature for {}", build)).unwrap();
    dir
  }

  /// The `base` release: a single zero-byte file.
  pub fn base_release(&self) -> PathBuf {
    self.release("base", &[("null.txt", b"")], &[])
  }

  /// The `update` release: `base` plus a `foo.txt` in the `sub` component.
  pub fn update_release(&self) -> PathBuf {
    self.release("update", &[("null.txt", b"")], &[("foo.txt", b"foo\r\n")])
  }

  pub fn install(&self, release: &Path) -> ReleaseInstaller {
    let mut installer = ReleaseInstaller::new(release, self.server_root(), BUILDER).unwrap();
    installer.build_update_installer().unwrap();
    installer
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    let _ = make_mutable(self.temp.path());
  }
}
