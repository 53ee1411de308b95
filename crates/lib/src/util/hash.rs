//! Content digests for the pool and for manifests.
//!
//! Every payload file and every component manifest is addressed by the
//! lowercase hex SHA-1 of its bytes, e.g. the empty file hashes to
//! `da39a3ee5e6b4b0d3255bfef95601890afd80709`.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::consts::DIGEST_HEX_LEN;

/// A 40-character lowercase hexadecimal SHA-1 digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether `value` looks like a digest we could have produced.
  ///
  /// Pool object names come from manifests, so they are checked before being
  /// joined onto the pool path.
  pub fn is_valid(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to read file {path}: {source}")]
pub struct HashError {
  pub path: String,
  #[source]
  pub source: std::io::Error,
}

/// Hash a file's contents.
///
/// Returns the digest together with the number of bytes read, which is the
/// size recorded in a manifest entry.
pub fn hash_file(path: &Path) -> Result<(ContentHash, u64), HashError> {
  let mut file = fs::File::open(path).map_err(|e| HashError {
    path: path.display().to_string(),
    source: e,
  })?;

  let mut hasher = Sha1::new();
  let mut buffer = [0u8; 8192];
  let mut size = 0u64;

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| HashError {
      path: path.display().to_string(),
      source: e,
    })?;
    if bytes_read == 0 {
      break;
    }
    size += bytes_read as u64;
    hasher.update(&buffer[..bytes_read]);
  }

  Ok((ContentHash(format!("{:x}", hasher.finalize())), size))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha1::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}
