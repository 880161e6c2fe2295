//! Reload trigger run after the configuration file changes.
//!
//! The reload is a side effect outside the section store's contract: it is attempted
//! once, its failure is logged, and the edit that preceded it still stands.

use std::process::Command;
use tracing::{info, warn};

/// Command the telephony service is reloaded with unless configured otherwise.
pub const DEFAULT_RELOAD_COMMAND: &str = "sudo systemctl reload asterisk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
/// What happened when a reload was requested.
pub enum ReloadOutcome {
    /// Reloading is switched off.
    Skipped,
    /// The command ran and exited successfully.
    Reloaded,
    /// The command could not be started or exited with an error.
    Failed,
}

#[derive(Debug, Clone)]
/// Runs a shell command to make the telephony service pick up the new file.
pub struct Reloader {
    command: Option<String>,
}

impl Reloader {
    #[must_use]
    /// Reloader running `command` through `sh -c`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    #[must_use]
    /// Reloader that does nothing.
    pub fn disabled() -> Self {
        Self { command: None }
    }

    #[must_use]
    /// The command that will run, if any.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Run the reload command and wait for it. Failures are logged, never returned.
    pub fn trigger(&self) -> ReloadOutcome {
        let Some(command) = self.command.as_deref() else {
            return ReloadOutcome::Skipped;
        };

        match Command::new("sh").arg("-c").arg(command).output() {
            Ok(output) if output.status.success() => {
                info!(command, "telephony service reloaded");
                ReloadOutcome::Reloaded
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    command,
                    status = %output.status,
                    stderr = %stderr.trim(),
                    "reload command failed"
                );
                ReloadOutcome::Failed
            }
            Err(e) => {
                warn!(command, error = %e, "could not start reload command");
                ReloadOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reload.rs"]
mod tests;
