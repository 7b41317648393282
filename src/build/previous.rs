//! Snapshot of the previously installed configuration files.

use std::path::{Path, PathBuf};

use crate::parser::{ConfigParser, ParseError, read_optional};
use crate::store::ParameterStore;

/// One previously installed file, read once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousFile {
    path: PathBuf,
    origin: String,
    text: String,
}

impl PreviousFile {
    /// Path the file was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Origin recorded on the sections this file declares.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// File contents.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Every previous-install file, read before any output is written.
///
/// Builds share one snapshot, so no build can observe a file another build
/// is replacing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousInstall {
    files: Vec<PreviousFile>,
}

impl PreviousInstall {
    /// Creates an empty snapshot (fresh install).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every existing file in `paths`; missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Read`] if an existing file cannot be read.
    pub fn load<'a, I>(paths: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut install = Self::new();
        for path in paths {
            if install.get(path).is_some() {
                continue;
            }
            match read_optional(path)? {
                Some(text) => install.insert(path, text),
                None => tracing::debug!("No previous config at {}", path.display()),
            }
        }
        Ok(install)
    }

    /// Adds a file to the snapshot, replacing any earlier copy of the same path.
    pub fn insert(&mut self, path: &Path, text: impl Into<String>) {
        let file = PreviousFile {
            path: path.to_path_buf(),
            origin: path.display().to_string(),
            text: text.into(),
        };
        match self.files.iter_mut().find(|f| f.path == path) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    /// Looks up a file by path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&PreviousFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Iterates the snapshot's files.
    pub fn files(&self) -> impl Iterator<Item = &PreviousFile> {
        self.files.iter()
    }

    /// Returns `true` if no previous file exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parses every file into a fresh store, each with its own origin.
    #[must_use]
    pub fn parse(&self, parser: &ConfigParser) -> ParameterStore {
        let mut store = ParameterStore::new();
        for file in &self.files {
            let count = parser.parse_str(&file.text, Some(&file.origin), &mut store);
            tracing::debug!("Read {count} parameter(s) from {}", file.path.display());
        }
        store
    }
}
