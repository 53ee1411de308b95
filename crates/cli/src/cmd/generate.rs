//! Implementation of the `relkit generate` command.
//!
//! Scans a release directory and writes one `MANIFEST.{component}` per
//! component plus the `release.spec` tying them together.

use std::path::Path;

use anyhow::{Context, Result, bail};

use relkit_lib::builder::{generate_release_files, scan_component};
use relkit_lib::consts::BUILD_FIELD;
use relkit_lib::manifest::is_valid_build_id;

use crate::output::{print_stat, print_success, truncate_hash};

pub fn cmd_generate(release_dir: &Path, build: &str, fields: &[String], components: &[String]) -> Result<()> {
  if !is_valid_build_id(build) {
    bail!("Invalid build id: {:?}", build);
  }
  if !release_dir.is_dir() {
    bail!("Release directory not found: {}", release_dir.display());
  }

  let mut header = vec![(BUILD_FIELD.to_string(), build.to_string())];
  for field in fields {
    header.push(parse_field(field)?);
  }

  let mut scanned = Vec::new();
  if components.is_empty() {
    let name = default_component_name(release_dir)?;
    scanned.push(scan_component(release_dir, &name, None).with_context(|| format!("Failed to scan {}", name))?);
  } else {
    for arg in components {
      let (name, subdir) = match arg.split_once('=') {
        Some((name, subdir)) => (name, Some(Path::new(subdir))),
        None => (arg.as_str(), None),
      };
      scanned.push(scan_component(release_dir, name, subdir).with_context(|| format!("Failed to scan {}", name))?);
    }
  }

  let spec = generate_release_files(release_dir, &header, &scanned)
    .with_context(|| format!("Failed to generate release files in {}", release_dir.display()))?;

  print_success(&format!("Generated release.spec for build {}", build));
  for entry in spec.manifests.iter() {
    print_stat(&entry.relative_path, truncate_hash(&entry.digest));
  }

  Ok(())
}

fn parse_field(arg: &str) -> Result<(String, String)> {
  let Some((key, value)) = arg.split_once('=') else {
    bail!("Field must be KEY=VALUE: {:?}", arg);
  };
  if key.is_empty() || key.contains(": ") || key.contains('\n') || value.contains('\n') {
    bail!("Invalid spec field: {:?}", arg);
  }
  Ok((key.to_string(), value.to_string()))
}

fn default_component_name(release_dir: &Path) -> Result<String> {
  let canonical = dunce::canonicalize(release_dir)
    .with_context(|| format!("Failed to resolve {}", release_dir.display()))?;
  canonical
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .context("Release directory has no name")
}
