//! Implementation of the `relkit release` command.
//!
//! Publishes whatever build is currently staged.

use std::path::Path;

use anyhow::{Context, Result};

use relkit_lib::server::UpdateServer;

use crate::output::{format_build, print_stat, print_success};

pub fn cmd_release(root: &Path, user: &str, notes: &str) -> Result<()> {
  let server = UpdateServer::new(root.to_path_buf(), user);

  let entry = server
    .release_from_staging(notes)
    .context("Failed to release staged build")?;

  print_success(&format!("Released build {}", entry.after));
  print_stat("Previous", format_build(&entry.before));
  if !entry.notes.is_empty() {
    print_stat("Notes", &entry.notes);
  }
  Ok(())
}
