//! Allow-list of option keys the engine tracks.

use regex::Regex;

/// Selects which option keys are captured and synchronized.
///
/// A key passes when it starts with any configured prefix or matches any
/// configured pattern. An empty filter passes every key.
///
/// # Examples
///
/// ```
/// use mmu_cfg::parser::KeyFilter;
///
/// let filter = KeyFilter::with_prefixes(["servo_", "gear_"])
///     .with_pattern(r"^variable_\w+$")
///     .unwrap();
///
/// assert!(filter.matches("servo_up_angle"));
/// assert!(filter.matches("variable_park_xy"));
/// assert!(!filter.matches("log_level"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl KeyFilter {
    /// Creates a filter that passes every key.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a filter from key prefixes.
    #[must_use]
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            patterns: Vec::new(),
        }
    }

    /// Adds a regular expression that keys may match.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Returns `true` if the filter passes every key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.patterns.is_empty()
    }

    /// Returns `true` if `key` is tracked.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.is_empty()
            || self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
            || self.patterns.iter().any(|r| r.is_match(key))
    }
}
