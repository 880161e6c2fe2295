//! Error type shared by the section store, the file wrapper and the edit plan.
//!
//! Every variant is a local, recoverable condition. The API layer turns them into
//! status codes with [`Error::status_code`].

use crate::scanner::Malformation;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failure of a section operation.
pub enum Error {
    /// No well-formed section carries the requested name.
    #[error("section '{name}' not found")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },

    /// The name cannot be embedded in a sentinel line.
    #[error("invalid section name '{name}': {reason}")]
    InvalidName {
        /// Name that was rejected.
        name: String,
        /// Which rule the name broke.
        reason: &'static str,
    },

    /// A body line would be read back as a sentinel.
    #[error("invalid body at line {line}: {reason}")]
    InvalidBody {
        /// One-based line within the body.
        line: usize,
        /// Which rule the line broke.
        reason: &'static str,
    },

    /// A request omitted a field the operation needs.
    #[error("{field} is required")]
    MissingField {
        /// Field that was absent.
        field: &'static str,
    },

    /// A sentinel line could not be paired.
    #[error("malformed document: {0}")]
    Malformed(Malformation),

    /// Reading or writing a file failed.
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// An edit plan could not be decoded.
    #[error("failed to parse edit plan at {path}: {source}")]
    Json {
        /// Plan file.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },

    /// The log file could not be watched for changes.
    #[error("failed to watch {path}: {source}")]
    Watch {
        /// Directory or file being watched.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: notify::Error,
    },

    /// The configuration file exists but could not be parsed.
    #[error("invalid configuration in {path}: {message}")]
    Config {
        /// Configuration file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl Error {
    #[must_use]
    /// Wraps an I/O failure with the operation and path it happened on.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    #[must_use]
    /// HTTP status the API layer answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidName { .. } | Self::InvalidBody { .. } | Self::MissingField { .. } => {
                400
            }
            Self::Malformed(_)
            | Self::Io { .. }
            | Self::Json { .. }
            | Self::Config { .. }
            | Self::Watch { .. } => 500,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
