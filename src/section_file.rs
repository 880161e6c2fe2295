//! File-backed access to the sections of one configuration file.
//!
//! Each mutation is a full read, an in-memory transform from [`crate::store`], and a
//! full write. Writes go to a temporary file in the same directory which then replaces
//! the target, so readers never observe a half-written configuration. Mutations take
//! `&mut self`; callers sharing one handle are serialised by the borrow checker, while
//! coordination between processes is left to the caller.

use crate::error::{Error, Result};
use crate::scanner::Scan;
use crate::section::Section;
use crate::store;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Debug, Clone)]
/// Handle on a configuration file whose sections are edited in place.
pub struct SectionFile {
    path: PathBuf,
}

impl SectionFile {
    #[must_use]
    /// Wrap the file at `path`. Nothing is read until an operation runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    /// Path of the wrapped file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| Error::io("reading", &self.path, e))
    }

    /// All well-formed sections in the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn list(&self) -> Result<Vec<Section>> {
        Ok(store::list_sections(&self.read()?))
    }

    /// Sections plus unpaired sentinels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn inspect(&self) -> Result<Scan> {
        Ok(store::inspect(&self.read()?))
    }

    /// First section called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on read failure or [`Error::NotFound`].
    pub fn get(&self, name: &str) -> Result<Section> {
        store::get_section(&self.read()?, name)
    }

    /// Append a section. A missing file is treated as an empty document and created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] or [`Error::Io`].
    pub fn create(&mut self, name: &str, body: &str) -> Result<()> {
        let document = match fs::read_to_string(&self.path) {
            Ok(document) => document,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::io("reading", &self.path, e)),
        };
        let updated = store::create_section(&document, name, body)?;
        self.write(&updated)?;
        info!(path = %self.path.display(), name, "section created");
        Ok(())
    }

    /// Replace the body of the first section called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Io`].
    pub fn replace(&mut self, name: &str, body: &str) -> Result<()> {
        self.update(|document| store::replace_section_body(document, name, body))?;
        info!(path = %self.path.display(), name, "section updated");
        Ok(())
    }

    /// Delete the first section called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Io`].
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.update(|document| store::delete_section(document, name))?;
        info!(path = %self.path.display(), name, "section deleted");
        Ok(())
    }

    /// Read the document, transform it, and write the result back.
    ///
    /// Nothing is written when `transform` fails.
    ///
    /// # Errors
    ///
    /// Returns the transform's error or [`Error::Io`].
    pub fn update<F>(&mut self, transform: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let document = self.read()?;
        let updated = transform(&document)?;
        self.write(&updated)
    }

    /// Replace the file's contents atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the temporary file cannot be written or persisted.
    pub fn write(&mut self, contents: &str) -> Result<()> {
        write_atomic(&self.path, contents)
    }
}

/// Write `contents` to `path` through a sibling temporary file.
///
/// The permissions of an existing target are carried over to the replacement.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the step that failed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| Error::io("creating temporary file", dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| Error::io("writing temporary file", tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io("syncing temporary file", tmp.path(), e))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())
            .map_err(|e| Error::io("copying permissions", tmp.path(), e))?;
    }

    tmp.persist(path)
        .map_err(|e| Error::io("replacing", path, e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/section_file.rs"]
mod tests;
