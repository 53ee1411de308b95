//! Text encoding of manifests and spec files.
//!
//! # Manifest
//!
//! ```text
//! da39a3ee5e6b4b0d3255bfef95601890afd80709 0 folder with space/empty.txt
//! 855426068ee8939df6bce2c2c4b1e7346532a133 5 foo.txt
//! ```
//!
//! Each line is split on single spaces into at most three fields, so the path
//! keeps any spaces it contains.
//!
//! # Spec file
//!
//! ```text
//! Update-URL: http://www.example.com/updates/
//! Build: base
//!
//! 82b90fb155029800cd45f08d32df240d672dfd5b 102 MANIFEST.base
//! ```

use std::collections::HashSet;

use super::types::{Manifest, ManifestEntry, ManifestError, SpecFile};

/// Parse manifest text. Entries keep the order they appear in.
pub fn parse_manifest(text: &str) -> Result<Manifest, ManifestError> {
  parse_manifest_lines(text, 0)
}

fn parse_manifest_lines(text: &str, line_offset: usize) -> Result<Manifest, ManifestError> {
  let mut entries = Vec::new();

  for (index, line) in text.lines().enumerate() {
    let line_no = line_offset + index + 1;
    let parse_err = |message: &str| ManifestError::Parse {
      line: line_no,
      message: message.to_string(),
    };

    let mut fields = line.splitn(3, ' ');
    let (Some(digest), Some(size), Some(path)) = (fields.next(), fields.next(), fields.next()) else {
      return Err(parse_err(&format!("expected `digest size path`, got {:?}", line)));
    };

    if digest.is_empty() || path.is_empty() {
      return Err(parse_err(&format!("empty field in {:?}", line)));
    }
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
      return Err(parse_err(&format!("size {:?} is not a decimal number", size)));
    }
    let size = size
      .parse::<u64>()
      .map_err(|e| parse_err(&format!("size {:?}: {}", size, e)))?;

    entries.push(ManifestEntry::new(digest, size, path));
  }

  Ok(Manifest::new(entries))
}

/// Serialize entries in canonical order, one `digest size path\n` line each.
pub fn serialize_manifest(entries: &[ManifestEntry]) -> String {
  let mut sorted: Vec<&ManifestEntry> = entries.iter().collect();
  sorted.sort_by(|a, b| a.canonical_cmp(b));

  let mut text = String::new();
  for entry in sorted {
    text.push_str(&entry.to_line());
    text.push('\n');
  }
  text
}

/// Parse a spec file: header, one blank line, manifest-of-manifests.
pub fn parse_spec_file(text: &str) -> Result<SpecFile, ManifestError> {
  let (header, body) = match text.strip_prefix('\n') {
    Some(body) => ("", body),
    None => match text.find("\n\n") {
      Some(index) => (&text[..=index], &text[index + 2..]),
      None => {
        return Err(ManifestError::Parse {
          line: text.lines().count() + 1,
          message: "missing blank line between header and manifest list".to_string(),
        });
      }
    },
  };

  let mut fields = Vec::new();
  let mut seen = HashSet::new();
  let mut header_lines = 0;

  for (index, line) in header.lines().enumerate() {
    header_lines += 1;
    let Some((key, value)) = line.split_once(": ") else {
      return Err(ManifestError::Parse {
        line: index + 1,
        message: format!("header line {:?} has no `: ` separator", line),
      });
    };
    if !seen.insert(key.to_string()) {
      return Err(ManifestError::DuplicateKey { key: key.to_string() });
    }
    fields.push((key.to_string(), value.to_string()));
  }

  let manifests = parse_manifest_lines(body, header_lines + 1)?;
  Ok(SpecFile::new(fields, manifests))
}

/// Serialize a spec file with fields in the given order.
pub fn serialize_spec_file(fields: &[(String, String)], manifest_of_manifests: &Manifest) -> String {
  let mut text = String::new();
  for (key, value) in fields {
    text.push_str(key);
    text.push_str(": ");
    text.push_str(value);
    text.push('\n');
  }
  text.push('\n');
  text.push_str(&serialize_manifest(&manifest_of_manifests.entries));
  text
}

impl SpecFile {
  pub fn to_text(&self) -> String {
    serialize_spec_file(&self.fields, &self.manifests)
  }
}

impl Manifest {
  pub fn to_text(&self) -> String {
    serialize_manifest(&self.entries)
  }
}
