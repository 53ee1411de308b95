//! Status command implementation.
//!
//! Displays the staged and released builds and pool usage.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use relkit_lib::pool::ContentPool;
use relkit_lib::server::UpdateServer;

use crate::output::{OutputFormat, format_build, print_json, print_stat, print_success};

#[derive(Serialize)]
struct StatusReport {
  root: String,
  staging: String,
  release: String,
  pool_objects: usize,
}

pub fn cmd_status(root: &Path, user: &str, output: OutputFormat) -> Result<()> {
  let server = UpdateServer::new(root.to_path_buf(), user);
  let status = server.status().context("Failed to read pointers")?;
  let pool_objects = ContentPool::under_root(root)
    .digests()
    .context("Failed to list pool")?
    .len();

  if output.is_json() {
    print_json(&StatusReport {
      root: root.display().to_string(),
      staging: status.staging,
      release: status.release,
      pool_objects,
    })?;
  } else {
    print_success(&format!("Update server at {}", root.display()));
    print_stat("Staging", format_build(&status.staging));
    print_stat("Release", format_build(&status.release));
    print_stat("Pool objects", &pool_objects.to_string());
  }

  Ok(())
}
