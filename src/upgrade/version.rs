//! `MAJOR.MINOR` schema versions.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::UpgradeError;

/// A configuration schema version.
///
/// The minor part is read as hundredths, so `3.1` and `3.10` are the same
/// version and `3.05` sorts before `3.10`. Versions display as `MAJOR.MM`.
///
/// # Examples
///
/// ```
/// use mmu_cfg::upgrade::Version;
///
/// let v: Version = "3.1".parse().unwrap();
/// assert_eq!(v, Version::new(3, 10));
/// assert_eq!(v.to_string(), "3.10");
/// assert!("3.05".parse::<Version>().unwrap() < v);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
}

impl Version {
    /// Creates a version; `minor` is in hundredths (`Version::new(3, 10)` is `3.10`).
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Major component.
    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    /// Minor component in hundredths.
    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }
}

impl FromStr for Version {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UpgradeError::InvalidVersion {
            value: s.to_string(),
        };
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some(parts) => parts,
            None => (trimmed, ""),
        };

        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if minor.len() > 2 || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let major = major.parse().map_err(|_| invalid())?;
        let minor = match minor.len() {
            0 => 0,
            1 => minor.parse::<u32>().map_err(|_| invalid())? * 10,
            _ => minor.parse().map_err(|_| invalid())?,
        };
        Ok(Self { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
