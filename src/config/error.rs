//! Error types for manifest parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::upgrade::UpgradeError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the manifest.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the manifest
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML manifest.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write the manifest (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the manifest
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or manifest.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// Target version is not `MAJOR.MINOR`.
    #[error("Invalid {field} '{value}': expected MAJOR.MINOR, e.g. 3.20")]
    InvalidVersion {
        /// Field the value came from
        field: &'static str,
        /// The invalid value
        value: String,
    },

    /// Invalid regex pattern in the parameter allow-list.
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The invalid pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Worker count is zero.
    #[error("Invalid jobs value {0}: must be greater than 0")]
    InvalidJobs(usize),

    /// A token value is not a string, number or boolean.
    #[error("Invalid token '{name}': expected a string, number or boolean, got {kind}")]
    InvalidToken {
        /// Token name
        name: String,
        /// TOML type of the value
        kind: &'static str,
    },

    /// The manifest declares no targets.
    #[error("No targets defined. Add at least one [[target]] to the config file")]
    NoTargets,

    /// `--target` names a target the manifest does not declare.
    #[error("Unknown target '{name}'")]
    UnknownTarget {
        /// The requested name
        name: String,
    },

    /// Two targets would write the same file.
    #[error("Targets '{first}' and '{second}' both write '{}'", path.display())]
    DuplicateOutput {
        /// First target
        first: String,
        /// Second target
        second: String,
        /// Shared output path
        path: PathBuf,
    },

    /// The upgrade graph could not be assembled.
    #[error("Invalid upgrade graph: {0}")]
    Upgrade(#[from] UpgradeError),
}

/// Well-known field names for `MissingRequired` and `InvalidVersion` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The target version field.
    pub const VERSION: &str = "version";
    /// The template path of a `[[target]]`.
    pub const TEMPLATE: &str = "template";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
