//! Symbolic link helpers used for pointer files.

use std::io;
use std::path::Path;

/// Create a symlink at `link` pointing at the file `target`.
pub fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(target, link)
  }
  #[cfg(windows)]
  {
    std::os::windows::fs::symlink_file(target, link)
  }
}

/// Whether `path` itself exists, without following a symlink.
///
/// A dangling pointer still counts as present so it can be replaced.
pub fn entry_exists(path: &Path) -> bool {
  std::fs::symlink_metadata(path).is_ok()
}
