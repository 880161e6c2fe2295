//! The edit plan batches section operations across configuration files.
//!
//! A plan is plain JSON, so it can be written by hand, produced by another tool, or
//! saved from one session and applied in another. Edits are grouped by file and
//! applied in order to an in-memory copy of each document. Every document is computed
//! before any is written: a plan with one failing edit leaves all files untouched.

use crate::error::{Error, Result};
use crate::section_file::write_atomic;
use crate::store;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
/// Serialisable collection of section operations for batch application.
pub struct EditPlan {
    /// Operations in the order they are applied.
    pub edits: Vec<Edit>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// One section operation against one file.
pub struct Edit {
    /// Configuration file the operation targets.
    pub file_name: String,
    /// What to do to the file.
    #[serde(flatten)]
    pub op: SectionOp,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
/// A single section mutation.
pub enum SectionOp {
    /// Append a new section.
    Create {
        /// Section name.
        name: String,
        /// Body text.
        body: String,
    },
    /// Replace the body of the first section with this name.
    Replace {
        /// Section name.
        name: String,
        /// New body text.
        body: String,
    },
    /// Remove the first section with this name.
    Delete {
        /// Section name.
        name: String,
    },
}

impl SectionOp {
    #[must_use]
    /// Name of the section the operation targets.
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. } | Self::Replace { name, .. } | Self::Delete { name } => name,
        }
    }

    /// Apply the operation to `document`, returning the new document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] or [`Error::InvalidBody`] for a bad create or
    /// replace, or [`Error::NotFound`].
    pub fn apply_to(&self, document: &str) -> Result<String> {
        match self {
            Self::Create { name, body } => store::create_section(document, name, body),
            Self::Replace { name, body } => store::replace_section_body(document, name, body),
            Self::Delete { name } => store::delete_section(document, name),
        }
    }
}

impl EditPlan {
    /// Read a plan from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io("reading", path, e))?;
        serde_json::from_str(&contents).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply every edit in the plan.
    ///
    /// Groups edits by file, computes each file's new document, and writes only once
    /// all of them succeeded. Different spellings of one file share a group. Returns
    /// the files written, in order of first appearance and as first spelled.
    ///
    /// # Errors
    ///
    /// Returns the first failing edit's error, or [`Error::Io`] from reading or writing.
    pub fn apply(&self) -> Result<Vec<PathBuf>> {
        let mut file_groups: Vec<(PathBuf, &str, Vec<&SectionOp>)> = Vec::new();

        for edit in &self.edits {
            let key = file_key(Path::new(&edit.file_name));
            match file_groups.iter_mut().find(|(seen, _, _)| *seen == key) {
                Some((_, _, ops)) => ops.push(&edit.op),
                None => file_groups.push((key, edit.file_name.as_str(), vec![&edit.op])),
            }
        }

        let mut results = Vec::with_capacity(file_groups.len());
        for (_, file_name, ops) in file_groups {
            let path = PathBuf::from(file_name);
            let mut document =
                fs::read_to_string(&path).map_err(|e| Error::io("reading", &path, e))?;
            for op in ops {
                document = op.apply_to(&document)?;
            }
            results.push((path, document));
        }

        let mut written = Vec::with_capacity(results.len());
        for (path, document) in results {
            write_atomic(&path, &document)?;
            info!(path = %path.display(), "applied edit plan");
            written.push(path);
        }

        Ok(written)
    }
}

/// Identity of the file behind `path`: its canonical form when it exists, otherwise
/// the absolute path with `.` and `..` resolved lexically.
fn file_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut key = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}

#[cfg(test)]
#[path = "tests/edit_plan.rs"]
mod tests;
