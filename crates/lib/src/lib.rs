//! relkit-lib: content-addressed release manifests and update staging
//!
//! This crate provides the building blocks of an update server:
//! - `manifest`: the manifest and spec-file text formats
//! - `builder`: generating manifests and spec files for a release directory
//! - `pool`: the content-addressed payload pool
//! - `install`: installing a built release into a server root
//! - `server`: the `staging` / `release` pointers and their logs
//! - `remote`: ssh/rsync access to a remote server

pub mod builder;
pub mod consts;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod pool;
pub mod remote;
pub mod server;
pub mod util;
