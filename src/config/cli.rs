//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mmu-cfg: MMU configuration builder
///
/// Renders configuration templates, carries values over from a previous
/// install, and upgrades old installs across schema versions.
#[derive(Debug, Parser)]
#[command(name = "mmu-cfg")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the build manifest
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Schema version being installed, e.g. 3.20
    #[arg(long = "target-version", value_name = "VERSION", global = true)]
    pub target_version: Option<String>,

    /// Directory holding the previously installed files
    #[arg(long = "previous-dir", value_name = "DIR", global = true)]
    pub previous_dir: Option<PathBuf>,

    /// Directory outputs are written to
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Only build the named target (can be specified multiple times)
    #[arg(long = "target", value_name = "NAME", global = true)]
    pub targets: Vec<String>,

    /// Maximum number of concurrent builds
    #[arg(long, short)]
    pub jobs: Option<usize>,

    /// Keep template values instead of carrying over previous ones
    #[arg(long = "skip-retain")]
    pub skip_retain: bool,

    /// Write a JSON report of every build to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Test mode - build everything but write no output files
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for mmu-cfg
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default build manifest
    Init {
        /// Output path for the manifest
        #[arg(long, short, default_value = super::defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Report how the previous install relates to the target version
    CheckVersion,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if this is the check-version command.
    #[must_use]
    pub const fn is_check_version(&self) -> bool {
        matches!(self.command, Some(Command::CheckVersion))
    }
}
