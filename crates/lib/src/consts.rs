pub const APP_NAME: &str = "relkit";

/// Spec file name inside a release directory and a manifest archive entry.
pub const RELEASE_SPEC: &str = "release.spec";

/// Suffix of a detached signature next to the file it signs.
pub const SIG_SUFFIX: &str = ".sig";

/// Prefix of per-component manifest file names (`MANIFEST.base`).
pub const MANIFEST_PREFIX: &str = "MANIFEST.";

pub const MANIFESTS_DIR: &str = "manifests";

pub const POOL_DIR: &str = "pool";

/// Installed paths under this prefix are part of a component's manifest.
pub const APP_PREFIX: &str = "{app}/";

/// Build id recorded in a transition log when a pointer did not exist yet.
pub const NULL_BUILD: &str = "<null>";

/// Header field naming the build a spec file describes.
pub const BUILD_FIELD: &str = "Build";

/// Length of a hex-encoded SHA-1 digest.
pub const DIGEST_HEX_LEN: usize = 40;
