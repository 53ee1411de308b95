//! Manifest and spec-file types and their text format.

mod codec;
mod types;

pub use codec::{parse_manifest, parse_spec_file, serialize_manifest, serialize_spec_file};
pub use types::*;
