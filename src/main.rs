//! mmu-cfg: MMU configuration builder
//!
//! Entry point for the mmu-cfg application.

use mmu_cfg::config::{Cli, Command, ValidatedConfig, write_default_config};
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Handle init subcommand
    if let Some(Command::Init { output }) = &cli.command {
        return handle_init(output);
    }

    // Load and validate configuration
    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    setup_tracing(config.verbose);
    tracing::debug!("{config}");

    if cli.is_check_version() {
        return handle_check_version(&config);
    }

    run_application(config)
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Manifest template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `check-version` subcommand.
fn handle_check_version(config: &ValidatedConfig) -> ExitCode {
    match run::check_version(config) {
        Ok(resolution) => {
            println!("{resolution}");
            exit_code::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            exit_code::build_error()
        }
    }
}

/// Builds every target with the given configuration.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_application(config: ValidatedConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            return exit_code::build_error();
        }
    };

    match runtime.block_on(run::execute(config)) {
        Ok(_) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Build error: {e}");
            exit_code::build_error()
        }
    }
}
