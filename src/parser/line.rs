//! Line classification for ini-style `.cfg` text.
//!
//! [`LineScanner`] is shared by the parser and the value synchronizer so both
//! agree on where sections start, which lines carry options and which lines
//! continue a multi-line value.

use std::ops::Range;

/// Comment that hands the rest of a file over to the user.
///
/// Everything from this line to end-of-file is never parsed into the store
/// and is carried over verbatim from the previous installation.
pub const EXCLUSION_MARKER: &str = "# EXCLUDE FROM CONFIG BUILDER";

/// A `key: value` (or `key = value`) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionLine<'a> {
    /// Option name, trimmed.
    pub key: &'a str,
    /// Option value without inline comment and surrounding whitespace.
    pub value: &'a str,
    /// Byte range of `value` within the line.
    pub value_span: Range<usize>,
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace-only line.
    Blank,
    /// Full-line `#` or `;` comment.
    Comment,
    /// The [`EXCLUSION_MARKER`] comment.
    Exclusion,
    /// `[name]` header.
    Section(&'a str),
    /// Option assignment.
    Option(OptionLine<'a>),
    /// Indented line continuing the previous option's value.
    Continuation,
    /// Anything else (left untouched).
    Other,
}

/// Stateful classifier that tracks the current section and value context.
#[derive(Debug, Default)]
pub struct LineScanner {
    section: String,
    in_value: bool,
}

impl LineScanner {
    /// Creates a scanner positioned before the first section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the section the last scanned line belongs to.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Classifies `line` (without its terminator) and advances the state.
    pub fn scan<'a>(&mut self, line: &'a str) -> LineKind<'a> {
        let trimmed = line.trim();

        if self.in_value && line.starts_with([' ', '\t']) && !trimmed.is_empty() {
            return LineKind::Continuation;
        }
        self.in_value = false;

        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if trimmed.starts_with(EXCLUSION_MARKER) {
            return LineKind::Exclusion;
        }
        if is_comment(trimmed) {
            return LineKind::Comment;
        }
        if let Some(name) = parse_section(trimmed) {
            name.clone_into(&mut self.section);
            return LineKind::Section(name);
        }
        match parse_option(line) {
            Some(option) => {
                self.in_value = true;
                LineKind::Option(option)
            }
            None => LineKind::Other,
        }
    }
}

/// Returns `true` if the (trimmed) line is a full-line comment.
#[must_use]
pub fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with(['#', ';'])
}

fn parse_section(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('[')?;
    let end = rest.find(']')?;
    let name = rest[..end].trim();
    (!name.is_empty()).then_some(name)
}

fn parse_option(line: &str) -> Option<OptionLine<'_>> {
    let sep = line.find([':', '='])?;
    let key = line[..sep].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    let after = sep + 1;
    let value_start = after + (line.len() - after - line[after..].trim_start().len());
    let comment_start = find_inline_comment(line, value_start).unwrap_or(line.len());
    let value_end = value_start + line[value_start..comment_start].trim_end().len();

    Some(OptionLine {
        key,
        value: &line[value_start..value_end],
        value_span: value_start..value_end,
    })
}

/// Finds the byte offset of an inline comment that starts at or after `from`.
///
/// A `#` or `;` opens a comment when it is the first character of the value
/// or follows whitespace.
fn find_inline_comment(line: &str, from: usize) -> Option<usize> {
    let mut prev_ws = true;
    for (i, c) in line[from..].char_indices() {
        if (c == '#' || c == ';') && prev_ws {
            return Some(from + i);
        }
        prev_ws = c.is_whitespace();
    }
    None
}
