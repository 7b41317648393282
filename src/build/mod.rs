//! Per-target build pipeline.
//!
//! [`build`] turns one template into one output file:
//!
//! 1. parse the previous-install snapshot into a fresh store;
//! 2. resolve and apply schema upgrades;
//! 3. render the template;
//! 4. carry over the user's excluded block;
//! 5. synchronize recovered values and collect leftovers;
//! 6. write the output atomically.
//!
//! Nothing is written unless every earlier step succeeded.

mod output;
mod previous;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use output::{carry_over_excluded, write_atomic};
pub use previous::{PreviousFile, PreviousInstall};

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::parser::{ConfigParser, ParseError, read_required};
use crate::render::{DocumentKind, RenderError, Renderer};
use crate::sync::{DeprecatedParameter, Rewrite, Synchronizer};
use crate::upgrade::{Resolution, UpgradeError, UpgradeRegistry, Version};

/// Errors that abort a single build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The template could not be read.
    #[error("Target '{target}': {source}")]
    Template {
        /// Target name
        target: String,
        /// Underlying read error
        #[source]
        source: ParseError,
    },

    /// The previous install could not be upgraded.
    #[error("Target '{target}': {source}")]
    Upgrade {
        /// Target name
        target: String,
        /// Underlying upgrade error
        #[source]
        source: UpgradeError,
    },

    /// The template could not be rendered.
    #[error("Target '{target}': {source}")]
    Render {
        /// Target name
        target: String,
        /// Underlying render error
        #[source]
        source: RenderError,
    },

    /// The output could not be written.
    #[error("Target '{target}': failed to write '{}': {source}", path.display())]
    Write {
        /// Target name
        target: String,
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One output file and where its inputs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Name used in logs, reports and `--target` filters.
    pub name: String,
    /// Template to render.
    pub template: PathBuf,
    /// File to write.
    pub output: PathBuf,
    /// Previously installed version of this file, if any.
    pub previous: Option<PathBuf>,
    /// Structural edits to apply.
    pub kind: DocumentKind,
}

/// Settings shared by every build of one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Schema version being installed.
    pub target_version: Version,
    /// Parser for previous-install files (and its key allow-list).
    pub parser: ConfigParser,
    /// Template renderer.
    pub renderer: Renderer,
    /// Upgrade graph.
    pub registry: UpgradeRegistry,
    /// Skip value synchronization entirely.
    pub skip_retain: bool,
    /// Build everything but write nothing.
    pub dry_run: bool,
}

impl BuildContext {
    /// Creates a context with the built-in upgrades and default settings.
    #[must_use]
    pub fn new(target_version: Version, renderer: Renderer, registry: UpgradeRegistry) -> Self {
        Self {
            target_version,
            parser: ConfigParser::default(),
            renderer,
            registry,
            skip_retain: false,
            dry_run: false,
        }
    }

    fn synchronizer(&self) -> Synchronizer {
        let (section, key) = self.registry.version_parameter();
        Synchronizer::new(self.parser.filter().clone()).with_pinned(section, key)
    }
}

/// What a build did.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    /// Target name.
    pub target: String,
    /// Output path.
    pub output: PathBuf,
    /// Relation of the installed version to the target version.
    pub resolution: Resolution,
    /// Values carried over from the previous install.
    pub rewrites: Vec<Rewrite>,
    /// Previous-install parameters the new file no longer has.
    pub deprecated: Vec<DeprecatedParameter>,
    /// Tokens left literal in the output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_tokens: Vec<String>,
    /// Whether the excluded block came from the previous install.
    pub excluded_block_retained: bool,
    /// Whether the output file was written.
    pub written: bool,
}

/// Builds one target.
///
/// # Errors
///
/// Returns a [`BuildError`] naming the target; on error no output is written.
pub fn build(
    target: &BuildTarget,
    context: &BuildContext,
    previous: &PreviousInstall,
) -> Result<BuildOutcome, BuildError> {
    tracing::info!("Building {} -> {}", target.name, target.output.display());

    let mut store = previous.parse(&context.parser);
    let resolution = context
        .registry
        .resolve(&mut store, context.target_version)
        .map_err(|source| BuildError::Upgrade {
            target: target.name.clone(),
            source,
        })?;

    let text = read_required(&target.template).map_err(|source| BuildError::Template {
        target: target.name.clone(),
        source,
    })?;
    let rendered = context
        .renderer
        .render(&target.template, &text, target.kind, &store)
        .map_err(|source| BuildError::Render {
            target: target.name.clone(),
            source,
        })?;
    let mut document = rendered.document;

    let previous_file = target.previous.as_deref().and_then(|p| previous.get(p));
    let excluded_block_retained = match previous_file {
        Some(file) => carry_over_excluded(&mut document, file.text()).map_err(|source| {
            BuildError::Render {
                target: target.name.clone(),
                source: RenderError::Section {
                    template: target.template.clone(),
                    source,
                },
            }
        })?,
        None => false,
    };

    let (rewrites, deprecated) = if context.skip_retain {
        tracing::debug!("{}: value retention skipped", target.name);
        (Vec::new(), Vec::new())
    } else {
        let synchronizer = context.synchronizer();
        let report = synchronizer.sync(&mut document, &mut store);
        let deprecated = previous_file
            .map(|file| synchronizer.leftovers(&store, file.origin()))
            .unwrap_or_default();
        (report.rewrites, deprecated)
    };
    report_deprecated(&target.output, &deprecated);

    let written = if context.dry_run {
        tracing::info!("Dry run, not writing {}", target.output.display());
        false
    } else {
        write_atomic(&target.output, &document.to_string()).map_err(|source| {
            BuildError::Write {
                target: target.name.clone(),
                path: target.output.clone(),
                source,
            }
        })?;
        true
    };

    tracing::info!(
        "Built {}: {}, {} value(s) retained, {} deprecated",
        target.name,
        resolution,
        rewrites.len(),
        deprecated.len()
    );

    Ok(BuildOutcome {
        target: target.name.clone(),
        output: target.output.clone(),
        resolution,
        rewrites,
        deprecated,
        unresolved_tokens: rendered.unresolved,
        excluded_block_retained,
        written,
    })
}

fn report_deprecated(output: &Path, deprecated: &[DeprecatedParameter]) {
    if deprecated.is_empty() {
        return;
    }
    tracing::warn!(
        "{} parameter(s) from the previous {} are no longer used:",
        deprecated.len(),
        output.display()
    );
    for parameter in deprecated {
        tracing::warn!("  {parameter}");
    }
}
