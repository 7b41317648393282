//! Re-insertion of options that a template does not carry.
//!
//! Some legal options are documented but absent from the shipped parameters
//! template, and a few are deliberately hidden. When a previous install set
//! them, they are appended to the parameters section so the value
//! synchronizer can carry them over instead of reporting them as deprecated.

use std::collections::BTreeSet;

use crate::parser::{LineKind, LineScanner};
use crate::section::{Document, SectionError, SectionRange};
use crate::store::ParameterStore;

/// Documented options that the parameters template leaves out.
pub const DEFAULT_SUPPLEMENTAL: &[&str] = &[
    "cad_gate0_pos",
    "cad_gate_width",
    "cad_bypass_offset",
    "cad_last_gate_offset",
    "cad_block_width",
    "cad_bypass_block_width",
    "cad_bypass_block_delta",
    "cad_selector_tolerance",
    "gate_material",
    "gate_color",
    "gate_spool_id",
    "gate_status",
    "gate_filament_name",
    "gate_temperature",
    "gate_speed_override",
    "endless_spool_groups",
    "tool_to_gate_map",
];

/// Legal options that are intentionally undocumented.
pub const DEFAULT_HIDDEN: &[&str] = &[
    "serious",
    "suppress_kalico_warning",
    "test_random_failures",
    "test_force_in_print",
    "error_dialog_macro",
    "error_macro",
    "toolhead_homing_macro",
    "park_macro",
    "save_position_macro",
    "restore_position_macro",
    "clear_position_macro",
    "encoder_dwell",
    "encoder_move_step_size",
    "gear_buzz_accel",
];

const HEADER: &str = "# Retained from previous install";

/// Options re-inserted into one section of the parameters document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementalOptions {
    section: String,
    keys: Vec<String>,
}

impl Default for SupplementalOptions {
    fn default() -> Self {
        Self::new(
            "mmu",
            DEFAULT_SUPPLEMENTAL.iter().chain(DEFAULT_HIDDEN).copied(),
        )
    }
}

impl SupplementalOptions {
    /// Creates a list for `section`.
    pub fn new<I, S>(section: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            section: section.to_string(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Section the options belong to.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Option names, in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Appends stored options missing from the rendered section.
    ///
    /// Returns the number of options inserted. A document without the
    /// section is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::InvalidPattern`] if the section name cannot be
    /// turned into an anchor.
    pub fn insert_missing(
        &self,
        doc: &mut Document,
        store: &ParameterStore,
    ) -> Result<usize, SectionError> {
        let present = keys_in_section(doc, &self.section);
        let missing: Vec<(&str, &str)> = self
            .keys
            .iter()
            .filter(|key| !present.contains(key.as_str()))
            .filter_map(|key| store.get(&self.section, key).map(|v| (key.as_str(), v)))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let anchor = format!(r"^\[{}\]", regex::escape(&self.section));
        let range = SectionRange::new(&anchor, r"^\[")?;
        let span = match range.locate(doc) {
            Ok(span) => span,
            Err(SectionError::AnchorNotFound { .. }) => {
                tracing::warn!(
                    "Section [{}] not in template, {} supplemental option(s) not retained",
                    self.section,
                    missing.len()
                );
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let eol = doc.line_ending();
        let mut text = String::new();
        if span.to_eof {
            text.push_str(eol);
        }
        text.push_str(HEADER);
        text.push_str(eol);
        for (key, value) in &missing {
            let value = value.replace('\n', eol);
            if value.starts_with(eol) {
                text.push_str(&format!("{key}:{value}{eol}"));
            } else {
                text.push_str(&format!("{key}: {value}{eol}"));
            }
        }
        if !span.to_eof {
            text.push_str(eol);
        }

        doc.insert_after(&range, &text)?;
        for (key, _) in &missing {
            tracing::debug!("Retained supplemental option [{}] {key}", self.section);
        }
        Ok(missing.len())
    }
}

fn keys_in_section<'a>(doc: &'a Document, section: &str) -> BTreeSet<&'a str> {
    let mut scanner = LineScanner::new();
    let mut keys = BTreeSet::new();
    for line in doc.lines() {
        if let LineKind::Option(option) = scanner.scan(line) {
            if scanner.section() == section {
                keys.insert(option.key);
            }
        }
    }
    keys
}
