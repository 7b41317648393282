//! Line-oriented structural edits on configuration text.
//!
//! A [`Document`] keeps every line together with its own terminator, so an
//! unedited document serializes back to its input byte-for-byte. Every edit
//! operates on a [`SectionRange`] and leaves the lines outside that range
//! untouched.
//!
//! # Ranges
//!
//! A range starts at the first line matching the start pattern and ends at
//! (excluding) the first later line matching the end pattern. An empty end
//! pattern, or one that never matches, runs the range to end-of-file.

mod numeral;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

use std::fmt;

use regex::Regex;
use thiserror::Error;

use crate::parser::line::is_comment;

/// Marker prefixed by [`Document::comment`] and stripped by [`Document::uncomment`].
pub const COMMENT_MARKER: char = '#';

/// Errors raised by section edits.
#[derive(Debug, Error)]
pub enum SectionError {
    /// No line matches the start pattern.
    #[error("Section anchor not found: '{pattern}'")]
    AnchorNotFound {
        /// The start pattern that matched nothing
        pattern: String,
    },

    /// A pattern is not a valid regular expression.
    #[error("Invalid section pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// What a caller wants to happen when a range's start anchor is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMissing {
    /// Propagate [`SectionError::AnchorNotFound`].
    #[default]
    Fail,
    /// Log a warning and leave the document unchanged.
    Skip,
}

/// Start and optional end pattern delimiting a block of lines.
#[derive(Debug, Clone)]
pub struct SectionRange {
    start: Regex,
    end: Option<Regex>,
}

impl SectionRange {
    /// Compiles a range. An empty `end` runs the range to end-of-file.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::InvalidPattern`] if either pattern is invalid.
    pub fn new(start: &str, end: &str) -> Result<Self, SectionError> {
        let start = compile(start)?;
        let end = if end.is_empty() {
            None
        } else {
            Some(compile(end)?)
        };
        Ok(Self { start, end })
    }

    /// Returns the start pattern source.
    #[must_use]
    pub fn start_pattern(&self) -> &str {
        self.start.as_str()
    }

    /// Returns the end pattern source (empty when the range runs to EOF).
    #[must_use]
    pub fn end_pattern(&self) -> &str {
        self.end.as_ref().map_or("", Regex::as_str)
    }

    /// Resolves the range against a document.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start pattern matches
    /// no line.
    pub fn locate(&self, doc: &Document) -> Result<Span, SectionError> {
        let start = doc
            .lines()
            .position(|line| self.start.is_match(line))
            .ok_or_else(|| SectionError::AnchorNotFound {
                pattern: self.start.as_str().to_string(),
            })?;

        let end = self.end.as_ref().and_then(|end| {
            doc.lines()
                .enumerate()
                .skip(start + 1)
                .find(|(_, line)| end.is_match(line))
                .map(|(i, _)| i)
        });

        Ok(match end {
            Some(end) => Span {
                start,
                end,
                to_eof: false,
            },
            None => Span {
                start,
                end: doc.len(),
                to_eof: true,
            },
        })
    }
}

impl fmt::Display for SectionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'..'{}'", self.start_pattern(), self.end_pattern())
    }
}

fn compile(pattern: &str) -> Result<Regex, SectionError> {
    Regex::new(pattern).map_err(|e| SectionError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

/// Resolved half-open line interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Index of the first line in the range.
    pub start: usize,
    /// Index one past the last line in the range.
    pub end: usize,
    /// `true` if the range runs to end-of-file.
    pub to_eof: bool,
}

/// Configuration text as a sequence of terminated lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Splits text into lines, keeping each line's terminator.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    /// Builds a document from already terminated lines.
    #[must_use]
    pub const fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Iterates line contents without terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| content(l))
    }

    /// Iterates lines including their terminators.
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Consumes the document, returning its terminated lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` for an empty document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line terminator used by this document (`\r\n` if its first line uses it).
    #[must_use]
    pub fn line_ending(&self) -> &'static str {
        match self.lines.first() {
            Some(l) if l.ends_with("\r\n") => "\r\n",
            _ => "\n",
        }
    }

    /// Returns the literal text of a range.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn select(&self, range: &SectionRange) -> Result<String, SectionError> {
        let span = range.locate(self)?;
        Ok(self.lines[span.start..span.end].concat())
    }

    /// Removes a range.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn delete(&mut self, range: &SectionRange) -> Result<(), SectionError> {
        let span = range.locate(self)?;
        self.lines.drain(span.start..span.end);
        Ok(())
    }

    /// Appends copies of a range for every index in `(from, to]`.
    ///
    /// Each copy replaces the standalone numeral `from` with its index.
    /// Multi-line blocks are separated by one blank line and inserted before
    /// the range's trailing blank lines; single lines are inserted directly.
    /// Returns the number of copies inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn duplicate(
        &mut self,
        range: &SectionRange,
        from: u32,
        to: u32,
    ) -> Result<usize, SectionError> {
        let span = range.locate(self)?;
        if to <= from || span.start == span.end {
            return Ok(0);
        }

        let eol = self.line_ending();
        let mut body_end = span.end;
        while body_end > span.start + 1 && content(&self.lines[body_end - 1]).trim().is_empty() {
            body_end -= 1;
        }
        terminate(&mut self.lines[body_end - 1], eol);

        let multi_line = body_end - span.start > 1;
        let needle = from.to_string();
        let mut copies = Vec::new();
        for index in from + 1..=to {
            if multi_line {
                copies.push(eol.to_string());
            }
            let replacement = index.to_string();
            copies.extend(
                self.lines[span.start..body_end]
                    .iter()
                    .map(|line| numeral::replace(line, &needle, &replacement)),
            );
        }

        let count = (to - from) as usize;
        self.lines.splice(body_end..body_end, copies);
        Ok(count)
    }

    /// Prefixes [`COMMENT_MARKER`] to every non-blank, non-comment line of a range.
    ///
    /// Returns the number of lines changed.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn comment(&mut self, range: &SectionRange) -> Result<usize, SectionError> {
        let span = range.locate(self)?;
        let mut changed = 0;
        for line in &mut self.lines[span.start..span.end] {
            let trimmed = content(line).trim();
            if !trimmed.is_empty() && !is_comment(trimmed) {
                line.insert(0, COMMENT_MARKER);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Strips one leading [`COMMENT_MARKER`] from every line of a range.
    ///
    /// Returns the number of lines changed.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn uncomment(&mut self, range: &SectionRange) -> Result<usize, SectionError> {
        let span = range.locate(self)?;
        let mut changed = 0;
        for line in &mut self.lines[span.start..span.end] {
            if line.starts_with(COMMENT_MARKER) {
                line.remove(0);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Inserts `text` right after a range, or at end-of-file if the range
    /// runs to EOF.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::AnchorNotFound`] if the start anchor is absent.
    pub fn insert_after(&mut self, range: &SectionRange, text: &str) -> Result<(), SectionError> {
        let span = range.locate(self)?;
        let eol = self.line_ending();

        if span.end > 0 {
            terminate(&mut self.lines[span.end - 1], eol);
        }

        let mut inserted: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        if let Some(last) = inserted.last_mut() {
            terminate(last, eol);
        }
        self.lines.splice(span.end..span.end, inserted);
        Ok(())
    }

    /// Appends text at end-of-file, terminating the previous last line.
    pub fn append(&mut self, text: &str) {
        let eol = self.line_ending();
        if let Some(last) = self.lines.last_mut() {
            terminate(last, eol);
        }
        self.lines.extend(text.split_inclusive('\n').map(str::to_string));
    }

    /// Replaces a line's full text (terminator included).
    pub(crate) fn replace_lines(&mut self, at: usize, count: usize, lines: Vec<String>) {
        self.lines.splice(at..at + count, lines);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Strips the line terminator (`\n` or `\r\n`).
#[must_use]
pub fn content(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn terminate(line: &mut String, eol: &str) {
    if !line.ends_with('\n') {
        line.push_str(eol);
    }
}
