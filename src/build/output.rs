//! Writing rendered files and carrying over user-owned blocks.

use std::path::{Path, PathBuf};

use crate::parser::EXCLUSION_MARKER;
use crate::section::{Document, SectionError, SectionRange};

/// Replaces the document's excluded block with the one from `previous`.
///
/// Nothing changes unless both texts contain the exclusion marker.
/// Returns `true` if the block was carried over.
///
/// # Errors
///
/// Returns [`SectionError::InvalidPattern`] if the marker anchor fails to
/// compile.
pub fn carry_over_excluded(doc: &mut Document, previous: &str) -> Result<bool, SectionError> {
    let range = SectionRange::new(&format!("^\\s*{}", regex::escape(EXCLUSION_MARKER)), "")?;
    let previous = Document::parse(previous);

    let block = match previous.select(&range) {
        Ok(block) => block,
        Err(SectionError::AnchorNotFound { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };
    match doc.delete(&range) {
        Ok(()) => {}
        Err(SectionError::AnchorNotFound { .. }) => return Ok(false),
        Err(e) => return Err(e),
    }
    doc.append(&block);
    Ok(true)
}

/// Writes `content` to `path` via `{path}.tmp` and a rename.
///
/// Parent directories are created. A symlink at `path` is replaced by a
/// regular file rather than followed.
///
/// # Errors
///
/// Returns the underlying I/O error of any step.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Append .tmp rather than replacing the extension (x.cfg -> x.cfg.tmp)
    let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&temp_path, content)?;

    let replaced = replace_with(&temp_path, path);
    if replaced.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    replaced
}

fn replace_with(temp_path: &Path, path: &Path) -> std::io::Result<()> {
    if path.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) {
        std::fs::remove_file(path)?;
    }
    std::fs::rename(temp_path, path)
}
