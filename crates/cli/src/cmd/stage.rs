use std::path::Path;

use anyhow::{Context, Result};

use relkit_lib::server::UpdateServer;

use crate::output::{format_build, print_stat, print_success};

pub fn cmd_stage(root: &Path, user: &str, build_id: &str, notes: &str) -> Result<()> {
  let server = UpdateServer::new(root.to_path_buf(), user);

  let entry = server
    .stage(build_id, notes)
    .with_context(|| format!("Failed to stage build {}", build_id))?;

  print_success(&format!("Staged build {}", entry.after));
  print_stat("Previous", format_build(&entry.before));
  Ok(())
}
