//! Implementation of the `relkit install` command.
//!
//! Archives a built release's manifests, copies its payloads into the pool
//! and points staging at it. `--step` runs a single step instead.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use relkit_lib::install::ReleaseInstaller;

use crate::InstallStep;
use crate::output::{format_bytes, format_duration, print_info, print_stat, print_success};

pub fn cmd_install(source: &Path, root: &Path, user: &str, step: Option<InstallStep>) -> Result<()> {
  let start = Instant::now();

  let mut installer = ReleaseInstaller::new(source, root, user)
    .with_context(|| format!("Failed to read release in {}", source.display()))?;
  let build = installer.build_id().to_string();

  let result = match step {
    None => installer.build_update_installer().map(|_| ()),
    Some(InstallStep::ManifestDir) => installer.build_manifest_dir(),
    Some(InstallStep::Pool) => installer.populate_pool().map(|added| {
      print_stat("New pool objects", &added.to_string());
    }),
    Some(InstallStep::Stage) => installer.symlink_staging_spec().map(|_| ()),
  };

  match result {
    Ok(()) => {}
    Err(e) if e.is_already_installed() => {
      print_info(&format!("Build {} is already installed", build));
      return Ok(());
    }
    Err(e) => return Err(e).with_context(|| format!("Failed to install build {}", build)),
  }

  let manifest = installer.full_manifest();
  match step {
    None | Some(InstallStep::Stage) => print_success(&format!("Staged build {}", build)),
    Some(_) => print_success(&format!("Install step complete for build {}", build)),
  }
  print_stat("Files", &manifest.len().to_string());
  print_stat("Payload size", &format_bytes(manifest.total_size()));
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
