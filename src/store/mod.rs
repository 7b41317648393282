//! Section-scoped parameter storage.
//!
//! A [`ParameterStore`] holds the `(section, key) -> value` pairs recovered
//! from a previous installation. One store is built per build invocation and
//! threaded through the pipeline by reference.
//!
//! # Origins
//!
//! Every section remembers the input file that first declared it. Leak
//! reporting uses this to attribute leftover parameters to exactly one
//! output file even when several previous-install files were parsed into the
//! same store.

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

use std::collections::BTreeMap;

/// Name of the implicit bucket for options that appear before any `[section]`.
pub const NO_SECTION: &str = "";

/// Identifies the input file a section was read from.
pub type Origin = String;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Section {
    origin: Option<Origin>,
    values: BTreeMap<String, String>,
}

/// In-memory `(section, key) -> value` map.
///
/// Values are opaque strings; interpreting them is the caller's job.
/// Every mutating operation is total: renaming, moving or copying a
/// parameter that does not exist is a no-op.
///
/// Iteration order is sorted by section then key, which keeps reports and
/// diagnostics reproducible across runs.
///
/// # Examples
///
/// ```
/// use mmu_cfg::store::ParameterStore;
///
/// let mut store = ParameterStore::new();
/// store.set("mmu", "gear_max_velocity", "300");
/// store.rename_key("mmu", "gear_max_velocity", "gear_max_speed");
///
/// assert_eq!(store.get("mmu", "gear_max_speed"), Some("300"));
/// assert!(!store.has("mmu", "gear_max_velocity"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterStore {
    sections: BTreeMap<String, Section>,
}

impl ParameterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, creating the section if needed.
    ///
    /// A newly created section has no origin.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .values
            .insert(key.to_string(), value.into());
    }

    /// Returns the value stored for `(section, key)`.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.values.get(key))
            .map(String::as_str)
    }

    /// Returns `true` if a value is stored for `(section, key)`.
    #[must_use]
    pub fn has(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Removes and returns the value for `(section, key)`.
    ///
    /// The section itself (and its origin) stays declared even when its last
    /// key is removed.
    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        self.sections
            .get_mut(section)
            .and_then(|s| s.values.remove(key))
    }

    /// Iterates the keys of every section whose name starts with `prefix`.
    ///
    /// The iterator borrows the store and can be recreated at will.
    pub fn keys_for_section<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.sections
            .iter()
            .filter(move |(name, _)| name.starts_with(prefix))
            .flat_map(|(_, section)| section.values.keys().map(String::as_str))
    }

    /// Renames a key within a section, keeping its value.
    ///
    /// Overwrites `to` if it already exists. No-op if `from` is absent.
    pub fn rename_key(&mut self, section: &str, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(s) = self.sections.get_mut(section) {
            if let Some(value) = s.values.remove(from) {
                s.values.insert(to.to_string(), value);
            }
        }
    }

    /// Moves every key of section `from` into section `to`.
    ///
    /// Keys already present in `to` are overwritten by `from`'s values.
    /// The origin follows the section unless `to` already had one.
    /// No-op if `from` is not declared.
    pub fn rename_section(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let Some(moved) = self.sections.remove(from) else {
            return;
        };
        let target = self.sections.entry(to.to_string()).or_default();
        if target.origin.is_none() {
            target.origin = moved.origin;
        }
        target.values.extend(moved.values);
    }

    /// Copies a value to another `(section, key)`, leaving the source intact.
    ///
    /// A destination section without an origin adopts the source section's
    /// origin. No-op if the source is absent.
    pub fn copy(&mut self, src_section: &str, src_key: &str, dst_section: &str, dst_key: &str) {
        let Some(value) = self.get(src_section, src_key).map(str::to_string) else {
            return;
        };
        let origin = self.origin_of(src_section).map(str::to_string);
        let target = self.sections.entry(dst_section.to_string()).or_default();
        if target.origin.is_none() {
            target.origin = origin;
        }
        target.values.insert(dst_key.to_string(), value);
    }

    /// Copies a value to another `(section, key)` and removes the source.
    pub fn move_key(&mut self, src_section: &str, src_key: &str, dst_section: &str, dst_key: &str) {
        if src_section == dst_section {
            self.rename_key(src_section, src_key, dst_key);
            return;
        }
        if self.has(src_section, src_key) {
            self.copy(src_section, src_key, dst_section, dst_key);
            self.remove(src_section, src_key);
        }
    }

    /// Declares a section, recording its origin if it has none yet.
    pub fn declare_section(&mut self, section: &str, origin: Option<&str>) {
        let entry = self.sections.entry(section.to_string()).or_default();
        if entry.origin.is_none() {
            entry.origin = origin.map(str::to_string);
        }
    }

    /// Returns `true` if the section is declared, even with no keys left.
    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Returns the input file that declared the section.
    #[must_use]
    pub fn origin_of(&self, section: &str) -> Option<&str> {
        self.sections.get(section).and_then(|s| s.origin.as_deref())
    }

    /// Iterates the names of all declared sections.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Iterates all `(section, key, value)` triples in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.sections.iter().flat_map(|(name, section)| {
            section
                .values
                .iter()
                .map(move |(k, v)| (name.as_str(), k.as_str(), v.as_str()))
        })
    }

    /// Returns the number of stored parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.values().map(|s| s.values.len()).sum()
    }

    /// Returns `true` if no parameters are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
