//! Application execution logic.
//!
//! This module reads the previous install once, builds every target on a
//! bounded pool of blocking tasks, and writes the optional JSON report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinError;

use mmu_cfg::build::{BuildOutcome, PreviousInstall, build, write_atomic};
use mmu_cfg::config::ValidatedConfig;
use mmu_cfg::parser::ParseError;
use mmu_cfg::upgrade::{Resolution, UpgradeError, Version};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to read the previous install.
    #[error("Failed to read previous install: {0}")]
    Snapshot(#[source] ParseError),

    /// The installed version cannot be brought to the target version.
    #[error("Version check failed: {0}")]
    Check(#[source] UpgradeError),

    /// The worker pool was closed while builds were queued.
    #[error("Worker pool closed: {0}")]
    Pool(#[source] AcquireError),

    /// A build task panicked or was cancelled.
    #[error("Build task failed: {0}")]
    Join(#[source] JoinError),

    /// Failed to serialize the report.
    #[error("Failed to serialize report: {0}")]
    ReportEncode(#[source] serde_json::Error),

    /// Failed to write the report.
    #[error("Failed to write report '{}': {source}", path.display())]
    ReportWrite {
        /// Report path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// One or more builds failed.
    #[error("{failed} of {total} build(s) failed")]
    BuildsFailed {
        /// Number of failed builds
        failed: usize,
        /// Number of builds attempted
        total: usize,
    },
}

/// A build that did not complete.
#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    /// Target name.
    pub target: String,
    /// Error message.
    pub error: String,
}

/// Result of one run, in target order.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Version that was installed.
    pub version: Version,
    /// Successful builds.
    pub outcomes: Vec<BuildOutcome>,
    /// Failed builds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BuildFailure>,
}

/// Builds every configured target.
///
/// Previous-install files are read before the first build starts. Builds run
/// with at most `config.jobs` in flight; a failed build does not stop the
/// others.
///
/// # Errors
///
/// Returns an error if:
/// - A previous-install file exists but cannot be read
/// - A build task panics
/// - The report cannot be written
/// - Any build failed (after the report has been written)
pub async fn execute(config: ValidatedConfig) -> Result<Report, RunError> {
    let previous = PreviousInstall::load(config.previous_paths()).map_err(RunError::Snapshot)?;
    tracing::debug!("Read {} previous file(s)", previous.files().count());

    let ValidatedConfig {
        target_version,
        targets,
        context,
        jobs,
        report: report_path,
        ..
    } = config;

    if context.dry_run {
        tracing::info!("Dry-run mode enabled - no files will be written");
    }

    let total = targets.len();
    let previous = Arc::new(previous);
    let context = Arc::new(context);
    let semaphore = Arc::new(Semaphore::new(jobs));

    let mut handles = Vec::with_capacity(total);
    for target in targets {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(RunError::Pool)?;
        let previous = Arc::clone(&previous);
        let context = Arc::clone(&context);
        let name = target.name.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            build(&target, &context, &previous)
        });
        handles.push((name, handle));
    }

    let mut report = Report {
        version: target_version,
        outcomes: Vec::with_capacity(total),
        failures: Vec::new(),
    };
    for (name, handle) in handles {
        match handle.await.map_err(RunError::Join)? {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => {
                tracing::error!("{e}");
                report.failures.push(BuildFailure {
                    target: name,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Built {} of {total} target(s) for version {target_version}",
        report.outcomes.len()
    );

    if let Some(path) = report_path {
        write_report(&path, &report)?;
        tracing::info!("Report written to {}", path.display());
    }

    if report.failures.is_empty() {
        Ok(report)
    } else {
        Err(RunError::BuildsFailed {
            failed: report.failures.len(),
            total,
        })
    }
}

/// Reports how the previous install relates to the target version.
///
/// Reads the same files a build would, but changes nothing on disk.
///
/// # Errors
///
/// Returns an error if a previous-install file cannot be read, or if no
/// upgrade path reaches the target version.
pub fn check_version(config: &ValidatedConfig) -> Result<Resolution, RunError> {
    let previous = PreviousInstall::load(config.previous_paths()).map_err(RunError::Snapshot)?;
    let store = previous.parse(&config.context.parser);

    config
        .context
        .registry
        .check(&store, config.target_version)
        .map_err(RunError::Check)
}

fn write_report(path: &Path, report: &Report) -> Result<(), RunError> {
    let mut json = serde_json::to_string_pretty(report).map_err(RunError::ReportEncode)?;
    json.push('\n');
    write_atomic(path, &json).map_err(|source| RunError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}
