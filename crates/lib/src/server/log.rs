//! Pointer transition log.
//!
//! `{root}/{pointer}.log` gets one line per repoint and is only ever appended
//! to:
//!
//! ```text
//! <null> base test-builder 2026-10-18T09:12:44Z
//! base update test-builder 2026-10-19T14:02:10Z nightly rebuild
//! ```

use serde::{Deserialize, Serialize};

use super::ServerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub before: String,
  pub after: String,
  pub user: String,
  pub time: String,
  pub notes: String,
}

impl LogEntry {
  /// The log line, including its trailing newline.
  pub fn to_line(&self) -> String {
    format!(
      "{} {} {} {} {}\n",
      self.before, self.after, self.user, self.time, self.notes
    )
  }
}

/// Parse a transition log. Blank lines are ignored; notes may be absent.
pub fn parse_log(text: &str) -> Result<Vec<LogEntry>, ServerError> {
  let mut entries = Vec::new();

  for (index, line) in text.lines().enumerate() {
    if line.is_empty() {
      continue;
    }

    let mut fields = line.splitn(5, ' ');
    let (Some(before), Some(after), Some(user), Some(time)) = (fields.next(), fields.next(), fields.next(), fields.next())
    else {
      return Err(ServerError::Parse {
        line: index + 1,
        message: format!("expected `before after user time [notes]`, got {:?}", line),
      });
    };

    entries.push(LogEntry {
      before: before.to_string(),
      after: after.to_string(),
      user: user.to_string(),
      time: time.to_string(),
      notes: fields.next().unwrap_or_default().to_string(),
    });
  }

  Ok(entries)
}

/// Fold notes onto a single line so one transition stays one log line.
pub(crate) fn single_line(notes: &str) -> String {
  notes.replace(['\r', '\n'], " ")
}
