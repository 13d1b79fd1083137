/// Length of the truncated hex digest used for graph and action fingerprints.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Prefix under which prebuilt module types register their modules.
pub const PREBUILT_PREFIX: &str = "prebuilt_";

/// Root directory of every generated build output path.
pub const OUT_DIR: &str = "out";
