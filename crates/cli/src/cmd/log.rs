use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use relkit_lib::server::{Pointer, UpdateServer};

use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_log(root: &Path, user: &str, pointer: Pointer, output: OutputFormat) -> Result<()> {
  let server = UpdateServer::new(root.to_path_buf(), user);
  let entries = server
    .read_log(pointer)
    .with_context(|| format!("Failed to read {} log", pointer))?;

  if output.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info(&format!("No {} history", pointer));
    return Ok(());
  }

  for entry in &entries {
    println!(
      "{} {} {} {}  {} {}",
      entry.time.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      entry.before,
      symbols::ARROW,
      entry.after.if_supports_color(Stream::Stdout, |s| s.green()),
      entry.user.if_supports_color(Stream::Stdout, |s| s.cyan()),
      entry.notes
    );
  }

  Ok(())
}
