//! Sentinel comment lines that open and close a section.
//!
//! A section named `NAME` starts at a line `;--- NAME ---` and ends at a line
//! `;/--- NAME ---`. The semicolon makes both lines comments as far as the telephony
//! server is concerned. Recognition ignores whitespace around the line (including a
//! trailing `\r`), and the name is taken literally: nothing in it is a pattern.

use crate::error::{Error, Result};

/// Text before the name on an opening sentinel.
pub const OPEN_PREFIX: &str = ";--- ";
/// Text before the name on a closing sentinel.
pub const CLOSE_PREFIX: &str = ";/--- ";
/// Text after the name on both sentinels.
pub const SUFFIX: &str = " ---";
/// Dash run that frames every sentinel; a name containing it could not be read back.
pub const DELIMITER: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A recognised sentinel line, borrowing the name from the source line.
pub enum Sentinel<'a> {
    /// `;--- NAME ---`
    Open(&'a str),
    /// `;/--- NAME ---`
    Close(&'a str),
}

impl<'a> Sentinel<'a> {
    #[must_use]
    /// Classify a document line, returning `None` for ordinary content.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if let Some(name) = framed(line, CLOSE_PREFIX) {
            return Some(Self::Close(name));
        }
        framed(line, OPEN_PREFIX).map(Self::Open)
    }

    #[must_use]
    /// Section name carried by the sentinel.
    pub fn name(self) -> &'a str {
        match self {
            Self::Open(name) | Self::Close(name) => name,
        }
    }
}

fn framed<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let name = line.strip_prefix(prefix)?.strip_suffix(SUFFIX)?;
    (!name.is_empty()).then_some(name)
}

#[must_use]
/// Opening sentinel line for `name`, without a line terminator.
pub fn open_line(name: &str) -> String {
    format!("{OPEN_PREFIX}{name}{SUFFIX}")
}

#[must_use]
/// Closing sentinel line for `name`, without a line terminator.
pub fn close_line(name: &str) -> String {
    format!("{CLOSE_PREFIX}{name}{SUFFIX}")
}

/// Check that `name` survives a trip through a sentinel line unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] when the name is empty, spans lines, has whitespace
/// at either end (recognition trims it away), or contains the `---` delimiter.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(['\n', '\r']) {
        "name contains a line break"
    } else if name.trim() != name {
        "name has leading or trailing whitespace"
    } else if name.contains(DELIMITER) {
        "name contains the sentinel delimiter '---'"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Check that no line of `body` would be recognised as a sentinel.
///
/// # Errors
///
/// Returns [`Error::InvalidBody`] naming the first offending line, counted from 1.
pub fn validate_body<'a, I>(lines: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for (index, line) in lines.into_iter().enumerate() {
        let reason = match Sentinel::parse(line) {
            Some(Sentinel::Open(_)) => "line is an opening sentinel",
            Some(Sentinel::Close(_)) => "line is a closing sentinel",
            None => continue,
        };
        return Err(Error::InvalidBody {
            line: index + 1,
            reason,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/sentinel.rs"]
mod tests;
