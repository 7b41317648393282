//! Template rendering: token substitution followed by structural edits.
//!
//! Rendering runs in three stages over one template:
//!
//! 1. every `{name}` with an entry in the token table is substituted;
//! 2. the [`DocumentKind`]'s [`EditStep`]s run in order, driven by
//!    [`Features`] and the gate count;
//! 3. for [`DocumentKind::Parameters`], supplemental options recovered from the
//!    previous install are appended to the parameters section.

mod kind;
mod supplemental;
mod tokens;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use kind::{DocumentKind, EditAction, EditStep, Features};
pub use supplemental::{DEFAULT_HIDDEN, DEFAULT_SUPPLEMENTAL, SupplementalOptions};
pub use tokens::{Substituted, TokenTable, substitute};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::section::{Document, OnMissing, SectionError};
use crate::store::ParameterStore;

/// Default name of the token holding the gate count.
pub const DEFAULT_GATES_TOKEN: &str = "num_gates";

/// Errors raised while rendering a template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A structural edit failed.
    #[error("Template '{}': {source}", template.display())]
    Section {
        /// Template being rendered
        template: PathBuf,
        /// Underlying edit error
        #[source]
        source: SectionError,
    },

    /// The gate count token is missing or not a positive integer.
    #[error(
        "Template '{}': token '{token}' must be a positive integer, got {}",
        template.display(),
        value.as_deref().map_or_else(|| "nothing".to_string(), |v| format!("'{v}'"))
    )]
    InvalidGateCount {
        /// Template being rendered
        template: PathBuf,
        /// Name of the gate count token
        token: String,
        /// Value found in the token table, if any
        value: Option<String>,
    },
}

/// A rendered template.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The rendered document.
    pub document: Document,
    /// Tokens left literal because the table had no entry for them.
    pub unresolved: Vec<String>,
    /// Supplemental options appended to the parameters section.
    pub supplemental: usize,
}

/// Renders templates with a fixed token table and feature set.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    tokens: TokenTable,
    features: Features,
    gates_token: Option<String>,
    supplemental: SupplementalOptions,
}

impl Renderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new(tokens: TokenTable, features: Features) -> Self {
        Self {
            tokens,
            features,
            ..Self::default()
        }
    }

    /// Overrides the name of the token that holds the gate count.
    #[must_use]
    pub fn with_gates_token(mut self, name: impl Into<String>) -> Self {
        self.gates_token = Some(name.into());
        self
    }

    /// Overrides the supplemental option list.
    #[must_use]
    pub fn with_supplemental(mut self, supplemental: SupplementalOptions) -> Self {
        self.supplemental = supplemental;
        self
    }

    /// Returns the token table.
    #[must_use]
    pub const fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    /// Returns the feature set.
    #[must_use]
    pub const fn features(&self) -> &Features {
        &self.features
    }

    fn gates_token(&self) -> &str {
        self.gates_token.as_deref().unwrap_or(DEFAULT_GATES_TOKEN)
    }

    /// Renders `text` (read from `template`) as a document of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Section`] when a step's anchor is missing and the
    /// step does not tolerate that, and [`RenderError::InvalidGateCount`] when
    /// a per-gate step runs without a usable gate count.
    pub fn render(
        &self,
        template: &Path,
        text: &str,
        kind: DocumentKind,
        store: &ParameterStore,
    ) -> Result<Rendered, RenderError> {
        let section_err = |source| RenderError::Section {
            template: template.to_path_buf(),
            source,
        };

        let Substituted { text, unresolved } = substitute(text, &self.tokens);
        if !unresolved.is_empty() {
            tracing::debug!(
                "{}: {} unresolved token(s): {}",
                template.display(),
                unresolved.len(),
                unresolved.join(", ")
            );
        }

        let mut document = Document::parse(&text);
        let steps = kind.steps(&self.features).map_err(section_err)?;
        let gates = if steps
            .iter()
            .any(|s| s.action == EditAction::DuplicatePerGate)
        {
            Some(self.gate_count(template)?)
        } else {
            None
        };

        for step in &steps {
            let result = match step.action {
                EditAction::Delete => document.delete(&step.range).map(|()| 1),
                EditAction::Comment => document.comment(&step.range),
                EditAction::Uncomment => document.uncomment(&step.range),
                EditAction::DuplicatePerGate => {
                    let last = gates.unwrap_or(1).saturating_sub(1);
                    document.duplicate(&step.range, 0, last)
                }
            };
            match result {
                Ok(changed) => tracing::debug!(
                    "{}: {:?} {} ({changed})",
                    template.display(),
                    step.action,
                    step.range
                ),
                Err(SectionError::AnchorNotFound { pattern })
                    if step.on_missing == OnMissing::Skip =>
                {
                    tracing::warn!(
                        "{}: no match for '{pattern}', {:?} skipped",
                        template.display(),
                        step.action
                    );
                }
                Err(e) => return Err(section_err(e)),
            }
        }

        let supplemental = if kind.inserts_supplemental() {
            self.supplemental
                .insert_missing(&mut document, store)
                .map_err(section_err)?
        } else {
            0
        };

        Ok(Rendered {
            document,
            unresolved,
            supplemental,
        })
    }

    fn gate_count(&self, template: &Path) -> Result<u32, RenderError> {
        let token = self.gates_token();
        let value = self.tokens.get(token);
        match value.and_then(|v| v.trim().parse::<u32>().ok()) {
            Some(n) if n > 0 => Ok(n),
            _ => Err(RenderError::InvalidGateCount {
                template: template.to_path_buf(),
                token: token.to_string(),
                value: value.cloned(),
            }),
        }
    }
}
