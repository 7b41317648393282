//! Default values for configuration options.
//!
//! Centralized constants to avoid magic values scattered across the codebase.

use std::num::NonZeroUsize;

/// Manifest read when `--config` is not given.
pub const CONFIG_FILE: &str = "mmu-cfg.toml";

/// Directory templates are read from.
pub const TEMPLATE_DIR: &str = ".";

/// Directory outputs are written to.
pub const OUTPUT_DIR: &str = ".";

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_JOBS: usize = 8;

/// Default number of concurrent builds: available parallelism, capped.
#[must_use]
pub fn jobs() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(MAX_DEFAULT_JOBS)
}
