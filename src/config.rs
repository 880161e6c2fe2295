//! Configuration to acknowledge deployment preferences as well as set defaults.
//!
//! Specifically, we try to find a marksect.toml, and if present we load settings from there.
//! Environment variables then override the file, and command-line flags override both.

use crate::error::{Error, Result};
use crate::reload::DEFAULT_RELOAD_COMMAND;
use facet::Facet;
use std::fs;
use std::io;
use std::path::Path;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "marksect.toml";

#[derive(Facet, Clone, Debug, PartialEq)]
/// Deployment settings loaded from marksect.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "/etc/asterisk/pjsip.conf".to_string())]
    /// Configuration file whose sections are edited.
    pub config_file: String,
    #[facet(default = "/var/log/asterisk/full".to_string())]
    /// Log file relayed to section subscribers.
    pub log_file: String,
    #[facet(default = DEFAULT_RELOAD_COMMAND.to_string())]
    /// Shell command that makes the telephony service re-read its configuration.
    pub reload_command: String,
    #[facet(default = true)]
    /// Whether mutations trigger the reload command.
    pub reload: bool,
}

impl Config {
    /// Load configuration from marksect.toml if present, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file exists but does not parse.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(Path::new(CONFIG_FILE_NAME))?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Load configuration from `path`, using defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a parse failure or [`Error::Io`] when the file
    /// exists but cannot be read.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::io("reading", path, e)),
        };
        facet_toml::from_str::<Self>(&contents).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    #[must_use]
    /// Apply `PJSIP_CONFIG`, `LOG_FILE` and `RELOAD_COMMAND` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PJSIP_CONFIG") {
            self.config_file = path;
        }
        if let Some(path) = lookup("LOG_FILE") {
            self.log_file = path;
        }
        if let Some(command) = lookup("RELOAD_COMMAND") {
            self.reload_command = command;
        }
        self
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
