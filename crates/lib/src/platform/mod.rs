//! Filesystem and environment concerns that differ between platforms.

pub mod immutable;
pub mod link;
pub mod paths;
