//! Configuration layer for mmu-cfg.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML build manifest parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Manifest generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML manifest** - Values from the manifest
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The target version has no default: it comes from `--target-version` or
//! `build.version`. Targets only come from the manifest; `--target` selects a
//! subset of them by name.
//!
//! # Paths
//!
//! Target paths are relative to `build.template_dir`, `build.output_dir` and
//! `build.previous_dir`. A leading `~` in manifest paths is expanded to the home
//! directory. Without a `previous_dir` the previous install is read from the
//! output directory, so the default build upgrades an install in place.
//!
//! # Boolean Flag Semantics
//!
//! `--skip-retain` uses OR semantics with `build.skip_retain`: if set `true` in
//! either CLI or TOML, the result is `true`.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod toml_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{
    BuildSection, FeaturesSection, ParamsSection, TargetSection, TomlConfig, UpgradeSection,
    default_config_template,
};
pub use validated::{ValidatedConfig, write_default_config};
