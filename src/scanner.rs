//! Single-pass line scanner that finds sections in a document.
//!
//! The scanner is a two-state machine, `Outside` and `InSection`. An opening sentinel
//! moves it into a section; only a closing sentinel repeating the same name completes
//! that section. Every sentinel that cannot be paired this way is recorded as a
//! [`Malformation`] and the region it would have delimited is left out of the result,
//! so a broken region can never be targeted by a rewrite.

use crate::section::Section;
use crate::sentinel::Sentinel;
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// A sentinel line the scanner could not pair, with its zero-based line index.
pub enum Malformation {
    /// Closing sentinel while no section was open. The line is skipped.
    UnmatchedClose {
        /// Line of the closing sentinel.
        line: usize,
        /// Name it carried.
        name: String,
    },
    /// Closing sentinel naming a different section than the open one. The open
    /// section is abandoned.
    MismatchedClose {
        /// Line of the closing sentinel.
        line: usize,
        /// Name of the section that was open.
        expected: String,
        /// Name the closing sentinel carried.
        found: String,
    },
    /// Opening sentinel while a section was already open. The earlier section is
    /// abandoned and a new one starts here.
    NestedOpen {
        /// Line of the second opening sentinel.
        line: usize,
        /// Name of the section that was open.
        open: String,
        /// Name of the new opening sentinel.
        found: String,
    },
    /// Document ended with a section still open. The section is dropped.
    Unterminated {
        /// Line of the opening sentinel.
        line: usize,
        /// Name of the unterminated section.
        name: String,
    },
}

impl Malformation {
    #[must_use]
    /// Zero-based line the problem was detected at.
    pub fn line(&self) -> usize {
        match self {
            Self::UnmatchedClose { line, .. }
            | Self::MismatchedClose { line, .. }
            | Self::NestedOpen { line, .. }
            | Self::Unterminated { line, .. } => *line,
        }
    }
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedClose { line, name } => {
                write!(f, "line {line}: closing sentinel for '{name}' has no opening")
            }
            Self::MismatchedClose {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: closing sentinel for '{found}' while '{expected}' is open"
            ),
            Self::NestedOpen { line, open, found } => write!(
                f,
                "line {line}: opening sentinel for '{found}' while '{open}' is still open"
            ),
            Self::Unterminated { line, name } => {
                write!(f, "line {line}: section '{name}' is never closed")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of scanning a document.
pub struct Scan {
    /// Well-formed sections in document order.
    pub sections: Vec<Section>,
    /// Unpaired sentinels in the order they were met.
    pub malformations: Vec<Malformation>,
}

impl Scan {
    #[must_use]
    /// Whether every sentinel in the document was paired.
    pub fn is_well_formed(&self) -> bool {
        self.malformations.is_empty()
    }
}

enum State<'a> {
    Outside,
    InSection {
        name: &'a str,
        start: usize,
        open_line: &'a str,
        body: Vec<&'a str>,
    },
}

#[must_use]
/// Scan `document` for sections. Lines are separated by `\n`; anything else,
/// including `\r`, stays part of the line.
pub fn scan(document: &str) -> Scan {
    let mut out = Scan::default();
    let mut state = State::Outside;

    for (index, line) in document.split('\n').enumerate() {
        state = match (state, Sentinel::parse(line)) {
            (State::Outside, Some(Sentinel::Open(name))) => State::InSection {
                name,
                start: index,
                open_line: line,
                body: Vec::new(),
            },
            (State::Outside, Some(Sentinel::Close(name))) => {
                out.malformations.push(Malformation::UnmatchedClose {
                    line: index,
                    name: name.to_string(),
                });
                State::Outside
            }
            (State::Outside, None) => State::Outside,
            (
                State::InSection {
                    name,
                    start,
                    open_line,
                    body,
                },
                Some(Sentinel::Close(closing)),
            ) => {
                if closing == name {
                    out.sections.push(Section {
                        name: name.to_string(),
                        body: body.into_iter().map(str::to_string).collect(),
                        start_line: start,
                        end_line: index,
                        open_line: open_line.to_string(),
                        close_line: line.to_string(),
                    });
                } else {
                    out.malformations.push(Malformation::MismatchedClose {
                        line: index,
                        expected: name.to_string(),
                        found: closing.to_string(),
                    });
                }
                State::Outside
            }
            (State::InSection { name, .. }, Some(Sentinel::Open(found))) => {
                out.malformations.push(Malformation::NestedOpen {
                    line: index,
                    open: name.to_string(),
                    found: found.to_string(),
                });
                State::InSection {
                    name: found,
                    start: index,
                    open_line: line,
                    body: Vec::new(),
                }
            }
            (
                State::InSection {
                    name,
                    start,
                    open_line,
                    mut body,
                },
                None,
            ) => {
                body.push(line);
                State::InSection {
                    name,
                    start,
                    open_line,
                    body,
                }
            }
        };
    }

    if let State::InSection { name, start, .. } = state {
        out.malformations.push(Malformation::Unterminated {
            line: start,
            name: name.to_string(),
        });
    }

    debug!(
        sections = out.sections.len(),
        malformations = out.malformations.len(),
        "scanned document"
    );
    out
}

#[cfg(test)]
#[path = "tests/scanner.rs"]
mod tests;
