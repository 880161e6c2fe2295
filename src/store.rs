//! Pure section operations over an in-memory document.
//!
//! Every function takes the whole document as text and returns a new document (or a
//! view of the existing one). Nothing here touches the filesystem, so the functions are
//! safe to call from any number of threads as long as each call is handed a consistent
//! snapshot. Mutations splice lines by index and rejoin with `\n`, which leaves every
//! byte outside the targeted section exactly as it was.

use crate::error::{Error, Result};
use crate::scanner::{scan, Scan};
use crate::section::{body_lines, Section};
use crate::sentinel::{close_line, open_line, validate_body, validate_name};
use tracing::{debug, warn};

#[must_use]
/// Sections of `document` in order, with malformed regions left out.
pub fn list_sections(document: &str) -> Vec<Section> {
    let scan = inspect(document);
    for malformation in &scan.malformations {
        warn!(%malformation, "skipping malformed region");
    }
    scan.sections
}

#[must_use]
/// Sections together with the sentinels that could not be paired.
pub fn inspect(document: &str) -> Scan {
    scan(document)
}

/// Check that every sentinel in `document` is paired.
///
/// # Errors
///
/// Returns [`Error::Malformed`] carrying the first problem found.
pub fn validate(document: &str) -> Result<()> {
    match scan(document).malformations.into_iter().next() {
        Some(malformation) => Err(Error::Malformed(malformation)),
        None => Ok(()),
    }
}

/// First section called `name`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no well-formed section has that name.
pub fn get_section(document: &str, name: &str) -> Result<Section> {
    scan(document)
        .sections
        .into_iter()
        .find(|section| section.name == name)
        .ok_or_else(|| Error::not_found(name))
}

/// Append a new section to the end of `document`.
///
/// The section is separated from existing content by a blank line and ends with a
/// newline. Names are not checked for uniqueness; a duplicate is shadowed by the
/// earlier section of the same name.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] when `name` cannot be written into a sentinel, or
/// [`Error::InvalidBody`] when a body line would be read back as a sentinel.
pub fn create_section(document: &str, name: &str, body: &str) -> Result<String> {
    validate_name(name)?;
    let lines = body_lines(body);
    validate_body(lines.iter().copied())?;

    let mut out = String::with_capacity(document.len() + body.len() + 2 * name.len() + 16);
    out.push_str(document);
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(&open_line(name));
    out.push('\n');
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&close_line(name));
    out.push('\n');

    debug!(name, "created section");
    Ok(out)
}

/// Replace the body of the first section called `name`, keeping its sentinels.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no well-formed section has that name, or
/// [`Error::InvalidBody`] when a line of `new_body` would be read back as a sentinel.
pub fn replace_section_body(document: &str, name: &str, new_body: &str) -> Result<String> {
    let section = get_section(document, name)?;
    let body = body_lines(new_body);
    validate_body(body.iter().copied())?;
    let lines: Vec<&str> = document.split('\n').collect();

    let range = section.body_range();
    let mut out = Vec::with_capacity(lines.len() - range.len() + body.len());
    out.extend_from_slice(&lines[..range.start]);
    out.extend(body);
    out.extend_from_slice(&lines[range.end..]);

    debug!(name, start = section.start_line, "replaced section body");
    Ok(out.join("\n"))
}

/// Remove the first section called `name`, sentinels included.
///
/// Blank lines around the section are left in place. When the section was the last
/// line of a document without a trailing newline, the line before it keeps its
/// terminator.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no well-formed section has that name.
pub fn delete_section(document: &str, name: &str) -> Result<String> {
    let section = get_section(document, name)?;
    let lines: Vec<&str> = document.split('\n').collect();

    let range = section.line_range();
    let mut out = Vec::with_capacity(lines.len() - range.len() + 1);
    out.extend_from_slice(&lines[..range.start]);
    out.extend_from_slice(&lines[range.end..]);
    if range.end == lines.len() && range.start > 0 {
        out.push("");
    }

    debug!(name, start = section.start_line, "deleted section");
    Ok(out.join("\n"))
}

#[cfg(test)]
#[path = "tests/store.rs"]
mod tests;
