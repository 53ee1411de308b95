//! Implementation of the `relkit push` command.
//!
//! Uploads a generated release directory to `{remote-dir}/{build}` on the
//! update server with rsync, then runs `relkit install` there over ssh.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use relkit_lib::consts::{APP_NAME, RELEASE_SPEC};
use relkit_lib::manifest::parse_spec_file;
use relkit_lib::remote::RemoteHost;

use crate::output::{print_info, print_success};

pub fn cmd_push(
  release_dir: &Path,
  server: &str,
  ssh_user: Option<String>,
  remote_dir: &str,
  exclude: &[String],
  user: &str,
) -> Result<()> {
  let spec_path = release_dir.join(RELEASE_SPEC);
  let text = fs::read_to_string(&spec_path).with_context(|| format!("Failed to read {}", spec_path.display()))?;
  let spec = parse_spec_file(&text).with_context(|| format!("Failed to parse {}", spec_path.display()))?;
  let build = spec.build_id()?.to_string();

  let host = RemoteHost::new(server, ssh_user);
  let remote_release = format!("{}/{}", remote_dir.trim_end_matches('/'), build);

  print_info(&format!("Uploading build {} to {}:{}", build, host.destination(), remote_release));
  // Trailing slash so rsync copies the directory's contents.
  host
    .upload(&release_dir.join(""), &remote_release, exclude)
    .context("Failed to upload release")?;

  print_info(&format!("Installing build {} on {}", build, server));
  let install = vec![
    APP_NAME.to_string(),
    "--user".to_string(),
    user.to_string(),
    "install".to_string(),
    remote_release,
  ];
  let output = host.run(&install).context("Remote install failed")?;
  if !output.output.trim().is_empty() {
    println!("{}", output.output.trim_end());
  }

  print_success(&format!("Pushed build {} to {}", build, server));
  Ok(())
}
