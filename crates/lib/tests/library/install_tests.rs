use std::fs;

use relkit_lib::install::{InstallError, InstallState, ReleaseInstaller};
use relkit_lib::pool::ContentPool;
use relkit_lib::server::{Pointer, UpdateServer};

use super::common::{BUILDER, FOO_HASH, NULL_HASH, Workspace};

#[test]
fn install_base_release() {
  let ws = Workspace::new();
  let release = ws.base_release();

  let installer = ws.install(&release);
  assert_eq!(installer.state(), InstallState::Installed);

  let root = ws.server_root();
  let object = root.join("pool").join(NULL_HASH);
  assert_eq!(fs::read(&object).unwrap(), b"");

  let archived = root.join("manifests/base/release.spec");
  assert!(fs::metadata(&archived).unwrap().permissions().readonly());
  assert!(root.join("manifests/base/MANIFEST.base").is_file());
  assert!(root.join("manifests/base/release.spec.sig").is_file());

  let server = UpdateServer::new(root.clone(), BUILDER);
  assert_eq!(server.current_build(Pointer::Staging).unwrap(), "base");

  let log = fs::read_to_string(root.join("staging.log")).unwrap();
  assert_eq!(log.lines().count(), 1);
  assert!(log.starts_with("<null> base test-builder "));
}

#[test]
fn install_release_then_update() {
  let ws = Workspace::new();
  let root = ws.server_root();
  let server = UpdateServer::new(root.clone(), BUILDER);

  ws.install(&ws.base_release());
  server.release_from_staging("v1.0").unwrap();
  ws.install(&ws.update_release());

  assert_eq!(server.current_build(Pointer::Release).unwrap(), "base");
  assert_eq!(server.current_build(Pointer::Staging).unwrap(), "update");
  assert_eq!(fs::read(root.join("pool").join(FOO_HASH)).unwrap(), b"foo\r\n");

  let transitions: Vec<_> = server
    .read_log(Pointer::Staging)
    .unwrap()
    .into_iter()
    .map(|e| (e.before, e.after))
    .collect();
  assert_eq!(
    transitions,
    vec![
      ("<null>".to_string(), "base".to_string()),
      ("base".to_string(), "update".to_string())
    ]
  );

  let release_log = server.read_log(Pointer::Release).unwrap();
  assert_eq!(release_log.len(), 1);
  assert_eq!(release_log[0].notes, "v1.0");

  assert_eq!(
    fs::read_to_string(root.join("staging.spec.sig")).unwrap(),
    "signature for update"
  );
  assert_eq!(
    fs::read_to_string(root.join("release.spec.sig")).unwrap(),
    "signature for base"
  );
}

#[test]
fn shared_payloads_are_pooled_once() {
  let ws = Workspace::new();

  ws.install(&ws.base_release());
  ws.install(&ws.update_release());

  let pool = ContentPool::under_root(&ws.server_root());
  assert_eq!(
    pool.digests().unwrap(),
    vec![FOO_HASH.to_string(), NULL_HASH.to_string()]
  );
}

#[test]
fn malformed_manifest_leaves_pool_untouched() {
  let ws = Workspace::new();
  let release = ws.update_release();
  fs::write(release.join("MANIFEST.sub"), "onlytwo fields\n").unwrap();

  let err = ReleaseInstaller::new(&release, ws.server_root(), BUILDER).unwrap_err();

  assert!(matches!(err, InstallError::Manifest { .. }));
  assert!(!ws.server_root().join("pool").exists());
}

#[test]
fn invalid_digest_leaves_server_untouched() {
  let ws = Workspace::new();
  let release = ws.update_release();
  fs::write(release.join("MANIFEST.sub"), format!("{} 3 foo.txt\nXYZ 1 bar.txt\n", FOO_HASH)).unwrap();

  let err = ReleaseInstaller::new(&release, ws.server_root(), BUILDER).unwrap_err();

  assert!(matches!(err, InstallError::Manifest { .. }));
  assert!(!ws.server_root().join("manifests").exists());
  assert!(!ws.server_root().join("pool").exists());
}

#[test]
fn reinstalling_a_build_is_already_installed() {
  let ws = Workspace::new();
  let release = ws.base_release();
  ws.install(&release);

  let mut again = ReleaseInstaller::new(&release, ws.server_root(), BUILDER).unwrap();
  let err = again.build_update_installer().unwrap_err();

  assert!(err.is_already_installed());
  assert_eq!(again.state(), InstallState::Created);
}

#[test]
fn steps_can_run_individually() {
  let ws = Workspace::new();
  let release = ws.update_release();
  let mut installer = ReleaseInstaller::new(&release, ws.server_root(), BUILDER).unwrap();

  assert_eq!(installer.populate_pool().unwrap(), 2);
  assert_eq!(installer.state(), InstallState::PoolPopulated);
  assert!(!ws.server_root().join("manifests").exists());

  installer.build_manifest_dir().unwrap();
  installer.symlink_staging_spec().unwrap();
  assert_eq!(installer.state(), InstallState::Installed);
}
