use std::fs;

use relkit_lib::server::{Pointer, ServerError, UpdateServer};

use super::common::{BUILDER, Workspace};

#[test]
fn pointers_start_unset() {
  let ws = Workspace::new();
  let server = UpdateServer::new(ws.server_root(), BUILDER);

  assert_eq!(server.current_build(Pointer::Staging).unwrap(), "<null>");
  assert_eq!(server.current_build(Pointer::Release).unwrap(), "<null>");
}

#[test]
fn repoint_logs_user_and_notes() {
  let ws = Workspace::new();
  ws.install(&ws.base_release());
  ws.install(&ws.update_release());
  let alice = UpdateServer::new(ws.server_root(), "alice");

  alice.stage("base", "").unwrap();
  alice.stage("update", "v1.0").unwrap();

  let entries = alice.read_log(Pointer::Staging).unwrap();
  let last = entries.last().unwrap();
  assert_eq!(
    (last.before.as_str(), last.after.as_str(), last.user.as_str(), last.notes.as_str()),
    ("base", "update", "alice", "v1.0")
  );
}

#[test]
fn release_tracks_staging_target() {
  let ws = Workspace::new();
  ws.install(&ws.base_release());
  let server = UpdateServer::new(ws.server_root(), BUILDER);

  server.release_from_staging("").unwrap();

  let root = ws.server_root();
  assert_eq!(
    fs::read_link(root.join("release.spec")).unwrap(),
    fs::read_link(root.join("staging.spec")).unwrap()
  );
  assert_eq!(server.status().unwrap().release, "base");
}

#[test]
fn staging_unknown_build_is_not_found() {
  let ws = Workspace::new();
  ws.install(&ws.base_release());
  let server = UpdateServer::new(ws.server_root(), BUILDER);

  assert!(matches!(server.stage("nope", ""), Err(ServerError::NotFound { .. })));
  assert_eq!(server.current_build(Pointer::Staging).unwrap(), "base");
}
