use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

const FOO_HASH: &str = "855426068ee8939df6bce2c2c4b1e7346532a133";

#[test]
fn install_stages_build() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n")]);

  env
    .relkit_cmd()
    .arg("install")
    .arg(&release)
    .assert()
    .success()
    .stdout(predicate::str::contains("Staged build b1"));

  let root = env.root_path();
  assert_eq!(fs::read(root.join("pool").join(FOO_HASH)).unwrap(), b"foo\r\n");
  assert!(root.join("manifests/b1/release.spec").is_file());
  assert!(root.join("manifests/b1/MANIFEST.base").is_file());
  assert_eq!(
    fs::read_to_string(root.join("staging.spec")).unwrap(),
    fs::read_to_string(release.join("release.spec")).unwrap()
  );
}

#[test]
fn reinstall_reports_already_installed() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n")]);
  env.install(&release);

  env
    .relkit_cmd()
    .arg("install")
    .arg(&release)
    .assert()
    .success()
    .stdout(predicate::str::contains("already installed"));
}

#[test]
fn install_single_step_populates_pool_only() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n"), ("empty", b"")]);

  env
    .relkit_cmd()
    .arg("install")
    .arg(&release)
    .args(["--step", "pool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("New pool objects: 2"));

  let root = env.root_path();
  assert!(root.join("pool").join(FOO_HASH).is_file());
  assert!(!root.join("manifests").exists());
  assert!(!root.join("staging.spec").exists());
}

#[test]
fn install_without_spec_fails() {
  let env = TestEnv::new();
  env.write_file("rel/foo.txt", b"foo\r\n");

  env
    .relkit_cmd()
    .arg("install")
    .arg(env.path("rel"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

#[test]
fn install_with_corrupt_manifest_fails_without_pooling() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n")]);
  fs::write(release.join("MANIFEST.base"), "garbage\n").unwrap();

  env.relkit_cmd().arg("install").arg(&release).assert().failure();

  assert!(!env.root_path().join("pool").exists());
}
