//! Section representation for sentinel-delimited regions of a configuration file.
//!
//! A section is a named run of lines between an opening and a closing sentinel.
//! Its line coordinates refer to the document snapshot it was scanned from and go
//! stale as soon as that document is rewritten.

use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Named region of a document with the coordinates needed to rewrite it.
pub struct Section {
    /// Name embedded in both sentinel lines.
    pub name: String,
    /// Lines strictly between the sentinels, without terminators.
    pub body: Vec<String>,
    /// Zero-based index of the opening sentinel line.
    pub start_line: usize,
    /// Zero-based index of the closing sentinel line.
    pub end_line: usize,
    /// Opening sentinel exactly as it appears in the document.
    pub open_line: String,
    /// Closing sentinel exactly as it appears in the document.
    pub close_line: String,
}

impl Section {
    #[must_use]
    /// Body lines joined with `\n`.
    pub fn body_text(&self) -> String {
        self.body.join("\n")
    }

    #[must_use]
    /// Line indices of the body within the source document.
    pub fn body_range(&self) -> Range<usize> {
        self.start_line + 1..self.end_line
    }

    #[must_use]
    /// Line indices from the opening through the closing sentinel.
    pub fn line_range(&self) -> Range<usize> {
        self.start_line..self.end_line + 1
    }

    #[must_use]
    /// The section's lines as they stand in the document, sentinels included.
    pub fn render(&self) -> Vec<&str> {
        let mut lines = Vec::with_capacity(self.body.len() + 2);
        lines.push(self.open_line.as_str());
        lines.extend(self.body.iter().map(String::as_str));
        lines.push(self.close_line.as_str());
        lines
    }
}

/// Split body text into lines; the empty string is an empty body.
///
/// A body of one blank line also reads back as `""`, so writing that text back
/// leaves the section with no body lines.
#[must_use]
pub fn body_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}
