//! Reading existing `.cfg` files into a [`ParameterStore`].
//!
//! Parsing is selective: only options whose key passes the caller's
//! [`KeyFilter`] and whose value is non-empty are captured. The parser never
//! modifies its input.

mod filter;
pub mod line;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use filter::KeyFilter;
pub use line::{EXCLUSION_MARKER, LineKind, LineScanner, OptionLine};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::ParameterStore;

/// Errors raised while reading configuration files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A required file does not exist.
    #[error("File not found: '{}'", path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Reads a file into a string, mapping a missing file to `None`.
///
/// # Errors
///
/// Returns [`ParseError::Read`] for any failure other than a missing file.
pub fn read_optional(path: &Path) -> Result<Option<String>, ParseError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ParseError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Reads a file that must exist.
///
/// # Errors
///
/// Returns [`ParseError::FileNotFound`] if the file is missing, or
/// [`ParseError::Read`] if it cannot be read.
pub fn read_required(path: &Path) -> Result<String, ParseError> {
    read_optional(path)?.ok_or_else(|| ParseError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Option value being collected across continuation lines.
struct PendingValue {
    section: String,
    key: String,
    value: String,
}

/// Selective `.cfg` parser.
#[derive(Debug, Clone, Default)]
pub struct ConfigParser {
    filter: KeyFilter,
}

impl ConfigParser {
    /// Creates a parser that captures keys passing `filter`.
    #[must_use]
    pub const fn new(filter: KeyFilter) -> Self {
        Self { filter }
    }

    /// Returns the key filter.
    #[must_use]
    pub const fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    /// Parses `text` into `store`, declaring every section with `origin`.
    ///
    /// Returns the number of parameters stored. Parsing stops at the
    /// [`EXCLUSION_MARKER`].
    pub fn parse_str(&self, text: &str, origin: Option<&str>, store: &mut ParameterStore) -> usize {
        let mut scanner = LineScanner::new();
        let mut pending: Option<PendingValue> = None;
        let mut stored = 0;

        for line in text.lines() {
            let kind = scanner.scan(line);

            if kind == LineKind::Continuation {
                if let Some(p) = pending.as_mut() {
                    p.value.push('\n');
                    p.value.push_str(line.trim_end());
                }
                continue;
            }

            if let Some(p) = pending.take() {
                stored += usize::from(Self::commit(p, origin, store));
            }

            match kind {
                LineKind::Exclusion => break,
                LineKind::Section(name) => store.declare_section(name, origin),
                LineKind::Option(option) if self.filter.matches(option.key) => {
                    pending = Some(PendingValue {
                        section: scanner.section().to_string(),
                        key: option.key.to_string(),
                        value: option.value.to_string(),
                    });
                }
                _ => {}
            }
        }

        if let Some(p) = pending {
            stored += usize::from(Self::commit(p, origin, store));
        }
        stored
    }

    /// Parses a file into `store`, using the file path as origin.
    ///
    /// A missing file is an error only when `required` is set; otherwise it
    /// contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::FileNotFound`] for a missing required file and
    /// [`ParseError::Read`] for unreadable files.
    pub fn parse_file(
        &self,
        path: &Path,
        required: bool,
        store: &mut ParameterStore,
    ) -> Result<usize, ParseError> {
        let text = if required {
            read_required(path)?
        } else if let Some(text) = read_optional(path)? {
            text
        } else {
            tracing::debug!("No previous config at {}, skipping", path.display());
            return Ok(0);
        };

        let origin = path.display().to_string();
        Ok(self.parse_str(&text, Some(&origin), store))
    }

    fn commit(pending: PendingValue, origin: Option<&str>, store: &mut ParameterStore) -> bool {
        if pending.value.trim().is_empty() {
            return false;
        }
        store.declare_section(&pending.section, origin);
        store.set(&pending.section, &pending.key, pending.value);
        true
    }
}
