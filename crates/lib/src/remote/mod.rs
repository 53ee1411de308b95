//! Running commands locally and on a remote update server.
//!
//! `RemoteHost` wraps `ssh` for remote commands and `rsync` for uploads. The
//! actual process spawning goes through a [`CommandRunner`] so callers can
//! substitute their own.

use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("command `{command}` failed with exit code {code:?}: {output}")]
  CommandFailed {
    command: String,
    code: Option<i32>,
    output: String,
  },
}

/// Combined stdout/stderr of a command that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
  pub output: String,
}

pub trait CommandRunner {
  /// Run `program` to completion. A non-zero exit is `CommandFailed`.
  fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RemoteError>;
}

/// Runs programs as child processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RemoteError> {
    let command_line = command_line(program, args);
    info!(cmd = %command_line, "executing command");

    let output = Command::new(program).args(args).output().map_err(|e| RemoteError::Spawn {
      program: program.to_string(),
      source: e,
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
      debug!(output = %combined, "command output");
      return Err(RemoteError::CommandFailed {
        command: command_line,
        code: output.status.code(),
        output: combined,
      });
    }

    if !combined.is_empty() {
      debug!(output = %combined.trim_end(), "command output");
    }

    Ok(CommandOutput { output: combined })
  }
}

/// A host reachable over ssh.
#[derive(Debug, Clone)]
pub struct RemoteHost<R = SystemRunner> {
  host: String,
  user: Option<String>,
  runner: R,
}

impl RemoteHost<SystemRunner> {
  pub fn new(host: impl Into<String>, user: Option<String>) -> Self {
    Self::with_runner(host, user, SystemRunner)
  }
}

impl<R: CommandRunner> RemoteHost<R> {
  pub fn with_runner(host: impl Into<String>, user: Option<String>, runner: R) -> Self {
    Self {
      host: host.into(),
      user,
      runner,
    }
  }

  /// `user@host`, or just `host` when no user is set.
  pub fn destination(&self) -> String {
    match &self.user {
      Some(user) => format!("{}@{}", user, self.host),
      None => self.host.clone(),
    }
  }

  /// Run `command` on the host.
  pub fn run(&self, command: &[String]) -> Result<CommandOutput, RemoteError> {
    let mut args = vec![self.destination()];
    args.extend(command.iter().cloned());
    self.runner.run("ssh", &args)
  }

  /// Mirror `src` to `dst` on the host, deleting remote files that are gone
  /// locally or match an exclude pattern.
  pub fn upload(&self, src: &Path, dst: &str, exclude: &[String]) -> Result<CommandOutput, RemoteError> {
    let mut args = vec![
      "-r".to_string(),
      "--delete".to_string(),
      "--delete-excluded".to_string(),
    ];
    args.extend(exclude.iter().map(|pattern| format!("--exclude={}", pattern)));
    args.push(src.display().to_string());
    args.push(format!("{}:{}", self.destination(), dst));
    self.runner.run("rsync", &args)
  }
}

fn command_line(program: &str, args: &[String]) -> String {
  std::iter::once(program)
    .chain(args.iter().map(String::as_str))
    .collect::<Vec<_>>()
    .join(" ")
}
