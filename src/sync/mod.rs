//! Carrying previous-install values into a rendered document.
//!
//! The [`Synchronizer`] walks a rendered document with the same
//! [`LineScanner`] the parser uses. Every recognized option whose
//! `(section, key)` is in the store is consumed; if the stored value differs,
//! only the value text is rewritten and the key, separator spacing, trailing
//! comment and line terminator are kept verbatim.
//!
//! Whatever the pass leaves in the store is a candidate leak: a parameter the
//! user set that the new templates no longer have.

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

use std::fmt;

use serde::Serialize;

use crate::parser::{KeyFilter, LineKind, LineScanner};
use crate::section::{Document, content};
use crate::store::ParameterStore;

/// Key prefix of user gcode options, which are never carried over.
pub const GCODE_PREFIX: &str = "gcode";

/// A value line rewritten from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    /// Section of the option.
    pub section: String,
    /// Option key.
    pub key: String,
    /// Value found in the template.
    pub old: String,
    /// Value recovered from the previous install.
    pub new: String,
}

/// A previous-install parameter that no template line consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprecatedParameter {
    /// Section the parameter was read from.
    pub section: String,
    /// Parameter key.
    pub key: String,
    /// Stored value.
    pub value: String,
}

impl fmt::Display for DeprecatedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.section, self.key, self.value)
    }
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Lines whose value changed.
    pub rewrites: Vec<Rewrite>,
    /// Store entries consumed, rewritten or not.
    pub consumed: usize,
}

/// Option being collected across continuation lines.
struct PendingOption {
    line: usize,
    section: String,
    key: String,
    value: String,
    value_span: std::ops::Range<usize>,
}

/// A replacement of `count` lines starting at `at`.
struct LineEdit {
    at: usize,
    count: usize,
    lines: Vec<String>,
}

/// Rewrites template values from a [`ParameterStore`].
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    filter: KeyFilter,
    pinned: Vec<(String, String)>,
}

impl Synchronizer {
    /// Creates a synchronizer that only touches keys passing `filter`.
    #[must_use]
    pub const fn new(filter: KeyFilter) -> Self {
        Self {
            filter,
            pinned: Vec::new(),
        }
    }

    /// Marks a parameter as owned by the template.
    ///
    /// A pinned parameter is consumed like any other but its template value
    /// is never replaced, and it is never reported as deprecated.
    #[must_use]
    pub fn with_pinned(mut self, section: &str, key: &str) -> Self {
        self.pinned.push((section.to_string(), key.to_string()));
        self
    }

    fn is_pinned(&self, section: &str, key: &str) -> bool {
        self.pinned.iter().any(|(s, k)| s == section && k == key)
    }

    /// Consumes matching store entries and rewrites differing values.
    ///
    /// Lines after the exclusion marker are left alone.
    pub fn sync(&self, doc: &mut Document, store: &mut ParameterStore) -> SyncReport {
        let mut report = SyncReport::default();
        let edits = {
            let raw: Vec<&str> = doc.raw_lines().collect();
            let eol = doc.line_ending();
            let mut edits = Vec::new();
            let mut scanner = LineScanner::new();
            let mut pending: Option<PendingOption> = None;

            for (i, line) in raw.iter().copied().map(content).enumerate() {
                let kind = scanner.scan(line);
                if kind == LineKind::Continuation {
                    if let Some(p) = pending.as_mut() {
                        p.value.push('\n');
                        p.value.push_str(line.trim_end());
                    }
                    continue;
                }

                if let Some(p) = pending.take() {
                    edits.extend(self.settle(p, i, &raw, eol, store, &mut report));
                }

                match kind {
                    LineKind::Exclusion => break,
                    LineKind::Option(option) if self.filter.matches(option.key) => {
                        pending = Some(PendingOption {
                            line: i,
                            section: scanner.section().to_string(),
                            key: option.key.to_string(),
                            value: option.value.to_string(),
                            value_span: option.value_span,
                        });
                    }
                    _ => {}
                }
            }
            if let Some(p) = pending {
                edits.extend(self.settle(p, raw.len(), &raw, eol, store, &mut report));
            }
            edits
        };

        for edit in edits.into_iter().rev() {
            doc.replace_lines(edit.at, edit.count, edit.lines);
        }
        report
    }

    /// Consumes one option; returns the edit if its value must change.
    fn settle(
        &self,
        option: PendingOption,
        end: usize,
        raw: &[&str],
        eol: &str,
        store: &mut ParameterStore,
        report: &mut SyncReport,
    ) -> Option<LineEdit> {
        let stored = store.remove(&option.section, &option.key)?;
        report.consumed += 1;

        if option.key.starts_with(GCODE_PREFIX) || self.is_pinned(&option.section, &option.key) {
            return None;
        }
        if stored == option.value {
            return None;
        }

        tracing::debug!(
            "[{}] {}: '{}' -> '{}'",
            option.section,
            option.key,
            option.value,
            stored
        );
        let lines = rewrite_lines(&option, &stored, &raw[option.line..end], eol);
        report.rewrites.push(Rewrite {
            section: option.section,
            key: option.key,
            old: option.value,
            new: stored,
        });
        Some(LineEdit {
            at: option.line,
            count: end - option.line,
            lines,
        })
    }

    /// Lists store entries read from `origin` that no template consumed.
    ///
    /// Pinned parameters are never listed.
    #[must_use]
    pub fn leftovers(&self, store: &ParameterStore, origin: &str) -> Vec<DeprecatedParameter> {
        store
            .iter()
            .filter(|(section, _, _)| store.origin_of(section) == Some(origin))
            .filter(|(section, key, _)| !self.is_pinned(section, key))
            .map(|(section, key, value)| DeprecatedParameter {
                section: section.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
            .collect()
    }
}

/// Builds the replacement for an option's lines.
///
/// The first segment of `stored` replaces the value span of the option line;
/// every further segment becomes its own continuation line, replacing the
/// template's continuation lines.
fn rewrite_lines(option: &PendingOption, stored: &str, raw: &[&str], eol: &str) -> Vec<String> {
    let first = content(raw[0]);
    let last_terminator = raw.last().map_or("", |l| &l[content(l).len()..]);

    let mut segments = stored.split('\n');
    let head = segments.next().unwrap_or_default();
    let tail: Vec<&str> = segments.collect();

    let prefix = &first[..option.value_span.start];
    let mut line = String::with_capacity(first.len() + head.len());
    line.push_str(prefix);
    if option.value.is_empty() && !head.is_empty() && !prefix.ends_with(char::is_whitespace) {
        line.push(' ');
    }
    line.push_str(head);
    let suffix = &first[option.value_span.end..];
    if option.value.is_empty() && !head.is_empty() && suffix.starts_with(['#', ';']) {
        line.push(' ');
    }
    line.push_str(suffix);

    let mut lines = Vec::with_capacity(1 + tail.len());
    lines.push(line);
    lines.extend(tail.into_iter().map(str::to_string));

    let count = lines.len();
    for (i, line) in lines.iter_mut().enumerate() {
        line.push_str(if i + 1 == count { last_terminator } else { eol });
    }
    lines
}
