//! Schema upgrades of previous-install parameters.
//!
//! Upgrades form a directed graph: nodes are [`Version`]s, edges are
//! registered [`Upgrade`] functions that mutate a [`ParameterStore`] from one
//! schema to the next. [`UpgradeRegistry::resolve`] reads the installed
//! version from the store, plans a path to the target version and only then
//! applies it, so a missing path never leaves a half-upgraded store.
//!
//! # Path selection
//!
//! From the current version the edge with the greatest destination not past
//! the target is taken (greedy longest hop). A registered long hop can encode
//! semantics a chain of short hops would miss, so it always wins.

mod builtin;
mod version;

#[cfg(test)]
mod builtin_tests;
#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use builtin::BUILTIN;
pub use version::Version;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::store::ParameterStore;

/// Default section holding the installed version.
pub const DEFAULT_VERSION_SECTION: &str = "mmu";

/// Default key holding the installed version.
pub const DEFAULT_VERSION_KEY: &str = "happy_hare_version";

/// Errors raised while registering or resolving upgrades.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// A version string could not be parsed.
    #[error("Invalid version '{value}', expected MAJOR.MINOR")]
    InvalidVersion {
        /// The offending text
        value: String,
    },

    /// An upgrade edge was rejected at registration.
    #[error("Invalid upgrade {from} -> {to}: {reason}")]
    InvalidEdge {
        /// Source version
        from: Version,
        /// Destination version
        to: Version,
        /// Why the edge was rejected
        reason: &'static str,
    },

    /// No chain of registered upgrades leads from the installed version to the target.
    #[error(
        "No upgrade path from {from} to {to}{}",
        lowest_known.map_or_else(String::new, |v| format!(", try upgrading to {v} first"))
    )]
    NoUpgradePath {
        /// Installed version
        from: Version,
        /// Target version
        to: Version,
        /// Lowest registered version with a path to the target
        lowest_known: Option<Version>,
    },
}

/// Function mutating a store from one schema version to the next.
pub type UpgradeFn = fn(&mut ParameterStore);

/// A registered upgrade edge.
#[derive(Clone)]
pub struct Upgrade {
    from: Version,
    to: Version,
    name: String,
    apply: UpgradeFn,
}

impl Upgrade {
    /// Source version.
    #[must_use]
    pub const fn from(&self) -> Version {
        self.from
    }

    /// Destination version.
    #[must_use]
    pub const fn to(&self) -> Version {
        self.to
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upgrade")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// How the installed version relates to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// No version parameter: nothing to upgrade.
    FreshInstall,
    /// Installed version equals the target.
    UpToDate {
        /// The shared version
        version: Version,
    },
    /// Installed version is newer than the target; parameters are kept as-is.
    Downgrade {
        /// Installed version
        from: Version,
        /// Target version
        to: Version,
    },
    /// A path of upgrades leads to the target.
    Upgrade {
        /// Installed version
        from: Version,
        /// Target version
        to: Version,
        /// Destination of every hop, in order
        hops: Vec<Version>,
    },
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreshInstall => f.write_str("fresh install"),
            Self::UpToDate { version } => write!(f, "up to date ({version})"),
            Self::Downgrade { from, to } => write!(f, "downgrade from {from} to {to}"),
            Self::Upgrade { from, hops, .. } => {
                write!(f, "upgrade {from}")?;
                for hop in hops {
                    write!(f, " -> {hop}")?;
                }
                Ok(())
            }
        }
    }
}

/// Directed graph of upgrade functions.
#[derive(Debug, Clone)]
pub struct UpgradeRegistry {
    edges: Vec<Upgrade>,
    version_section: String,
    version_key: String,
}

impl Default for UpgradeRegistry {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            version_section: DEFAULT_VERSION_SECTION.to_string(),
            version_key: DEFAULT_VERSION_KEY.to_string(),
        }
    }
}

impl UpgradeRegistry {
    /// Creates an empty registry reading the default version parameter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in upgrade chain.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidEdge`] if the built-in chain is
    /// inconsistent.
    pub fn builtin() -> Result<Self, UpgradeError> {
        let mut registry = Self::new();
        for (from, to, name, apply) in BUILTIN {
            registry.register(*from, *to, name, *apply)?;
        }
        Ok(registry)
    }

    /// Reads the installed version from `(section, key)` instead of the default.
    #[must_use]
    pub fn with_version_parameter(mut self, section: &str, key: &str) -> Self {
        section.clone_into(&mut self.version_section);
        key.clone_into(&mut self.version_key);
        self
    }

    /// Returns the `(section, key)` of the version parameter.
    #[must_use]
    pub fn version_parameter(&self) -> (&str, &str) {
        (&self.version_section, &self.version_key)
    }

    /// Returns the registered edges in registration order.
    #[must_use]
    pub fn edges(&self) -> &[Upgrade] {
        &self.edges
    }

    /// Registers an upgrade edge.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidEdge`] if `from >= to` or an edge for the
    /// same `(from, to)` pair already exists.
    pub fn register(
        &mut self,
        from: Version,
        to: Version,
        name: &str,
        apply: UpgradeFn,
    ) -> Result<(), UpgradeError> {
        if from >= to {
            return Err(UpgradeError::InvalidEdge {
                from,
                to,
                reason: "upgrades must move to a later version",
            });
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(UpgradeError::InvalidEdge {
                from,
                to,
                reason: "an upgrade for this pair is already registered",
            });
        }
        self.edges.push(Upgrade {
            from,
            to,
            name: name.to_string(),
            apply,
        });
        Ok(())
    }

    /// Plans the upgrades leading from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::NoUpgradePath`] if the walk gets stuck before
    /// reaching `to`.
    pub fn plan(&self, from: Version, to: Version) -> Result<Vec<&Upgrade>, UpgradeError> {
        self.walk(from, to).ok_or_else(|| UpgradeError::NoUpgradePath {
            from,
            to,
            lowest_known: self.lowest_known(to),
        })
    }

    fn walk(&self, from: Version, to: Version) -> Option<Vec<&Upgrade>> {
        let mut path = Vec::new();
        let mut current = from;
        while current < to {
            let hop = self
                .edges
                .iter()
                .filter(|e| e.from == current && e.to <= to)
                .max_by_key(|e| e.to)?;
            path.push(hop);
            current = hop.to;
        }
        Some(path)
    }

    /// Lowest registered source version from which `to` is reachable.
    fn lowest_known(&self, to: Version) -> Option<Version> {
        let mut starts: Vec<Version> = self
            .edges
            .iter()
            .map(|e| e.from)
            .filter(|v| *v < to)
            .collect();
        starts.sort_unstable();
        starts.dedup();
        starts.into_iter().find(|v| self.walk(*v, to).is_some())
    }

    /// Reads the installed version from the store.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidVersion`] if the stored value is malformed.
    pub fn installed_version(&self, store: &ParameterStore) -> Result<Option<Version>, UpgradeError> {
        store
            .get(&self.version_section, &self.version_key)
            .map(str::parse)
            .transpose()
    }

    /// Classifies the store against `target` without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidVersion`] for a malformed installed
    /// version and [`UpgradeError::NoUpgradePath`] when no path exists.
    pub fn check(&self, store: &ParameterStore, target: Version) -> Result<Resolution, UpgradeError> {
        let Some(from) = self.installed_version(store)? else {
            return Ok(Resolution::FreshInstall);
        };
        Ok(match from.cmp(&target) {
            std::cmp::Ordering::Equal => Resolution::UpToDate { version: from },
            std::cmp::Ordering::Greater => Resolution::Downgrade { from, to: target },
            std::cmp::Ordering::Less => Resolution::Upgrade {
                from,
                to: target,
                hops: self.plan(from, target)?.iter().map(|u| u.to).collect(),
            },
        })
    }

    /// Brings the store to `target`, applying each planned upgrade once.
    ///
    /// The version parameter is set to each hop's destination as it is
    /// applied. On error the store is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`UpgradeRegistry::check`].
    pub fn resolve(&self, store: &mut ParameterStore, target: Version) -> Result<Resolution, UpgradeError> {
        let resolution = self.check(store, target)?;
        match &resolution {
            Resolution::FreshInstall => tracing::debug!("No installed version, fresh install"),
            Resolution::UpToDate { version } => tracing::debug!("Installed version {version} is current"),
            Resolution::Downgrade { from, to } => tracing::warn!(
                "Installed version {from} is newer than {to}, parameters kept as they are"
            ),
            Resolution::Upgrade { from, to, .. } => {
                for upgrade in self.plan(*from, *to)? {
                    tracing::info!(
                        "Upgrading from {} to {} ({})",
                        upgrade.from,
                        upgrade.to,
                        upgrade.name
                    );
                    (upgrade.apply)(store);
                    store.set(
                        &self.version_section,
                        &self.version_key,
                        upgrade.to.to_string(),
                    );
                }
            }
        }
        Ok(resolution)
    }
}
