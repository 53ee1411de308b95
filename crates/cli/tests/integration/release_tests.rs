use predicates::prelude::*;

use super::common::{TEST_USER, TestEnv};

#[test]
fn status_of_empty_server() {
  let env = TestEnv::new();

  env
    .relkit_cmd()
    .arg("status")
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""staging": "<null>""#))
    .stdout(predicate::str::contains(r#""release": "<null>""#))
    .stdout(predicate::str::contains(r#""pool_objects": 0"#));
}

#[test]
fn release_publishes_staged_build() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n")]);
  env.install(&release);

  env
    .relkit_cmd()
    .arg("release")
    .args(["--notes", "v1.0"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Released build b1"));

  env
    .relkit_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Staging: b1"))
    .stdout(predicate::str::contains("Release: b1"));

  env
    .relkit_cmd()
    .args(["log", "release", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""before": "<null>""#))
    .stdout(predicate::str::contains(r#""after": "b1""#))
    .stdout(predicate::str::contains(format!(r#""user": "{}""#, TEST_USER)))
    .stdout(predicate::str::contains(r#""notes": "v1.0""#));
}

#[test]
fn release_without_staging_fails() {
  let env = TestEnv::new();

  env
    .relkit_cmd()
    .arg("release")
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

#[test]
fn stage_switches_between_installed_builds() {
  let env = TestEnv::new();
  let first = env.release("rel1", "b1", &[("foo.txt", b"foo\r\n")]);
  let second = env.release("rel2", "b2", &[("foo.txt", b"foo\r\n"), ("bar.txt", b"bar")]);
  env.install(&first);
  env.install(&second);

  env
    .relkit_cmd()
    .args(["stage", "b1", "--notes", "roll back"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Staged build b1"));

  env
    .relkit_cmd()
    .args(["log", "staging"])
    .assert()
    .success()
    .stdout(predicate::str::contains("b2"))
    .stdout(predicate::str::contains("roll back"));
}

#[test]
fn stage_unknown_build_fails() {
  let env = TestEnv::new();

  env
    .relkit_cmd()
    .args(["stage", "missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to stage build missing"));
}

#[test]
fn user_flag_overrides_environment() {
  let env = TestEnv::new();
  let release = env.release("rel", "b1", &[("foo.txt", b"foo\r\n")]);
  env.install(&release);

  env
    .relkit_cmd()
    .args(["--user", "alice", "release"])
    .assert()
    .success();

  env
    .relkit_cmd()
    .args(["log", "release", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""user": "alice""#));
}
