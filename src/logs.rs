//! Log relay: following a log file and routing its lines to section subscribers.
//!
//! Clients subscribe to the sections they are looking at. Each new log line is sent to
//! every client subscribed to a section whose name occurs in the line.

use crate::error::{Error, Result};
use crate::monitor::RelayEvent;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug)]
/// Follows a growing log file, yielding whole lines.
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl LogTail {
    /// Start following `path` from its current end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file's size cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let offset = std::fs::metadata(&path)
            .map_err(|e| Error::io("inspecting", &path, e))?
            .len();
        Ok(Self {
            path,
            offset,
            pending: Vec::new(),
        })
    }

    #[must_use]
    /// Start following `path` from its first byte.
    pub fn from_start(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    #[must_use]
    /// Path being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines completed since the last poll.
    ///
    /// A trailing partial line is held back until its newline arrives. When the file
    /// has shrunk, it is assumed rotated and read again from the start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut file = File::open(&self.path).map_err(|e| Error::io("opening", &self.path, e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::io("inspecting", &self.path, e))?
            .len();

        if len < self.offset {
            info!(path = %self.path.display(), "log file truncated, reading from start");
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| Error::io("seeking", &self.path, e))?;
        let read = file
            .read_to_end(&mut self.pending)
            .map_err(|e| Error::io("reading", &self.path, e))?;
        self.offset += read as u64;

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        let lines = String::from_utf8_lossy(&complete)
            .lines()
            .map(str::to_string)
            .collect::<Vec<_>>();

        debug!(path = %self.path.display(), lines = lines.len(), "read log lines");
        Ok(lines)
    }
}

/// Wakes a [`LogTail`] when its file changes on disk.
///
/// The watch is placed on the file's directory so a rotated log is picked up again
/// once it is recreated. Bursts of events are collapsed: after the first change the
/// follower absorbs further events for one debounce window, then reads.
pub struct LogFollower {
    tail: LogTail,
    changes: Receiver<()>,
    debounce: Duration,
    _watcher: RecommendedWatcher,
}

impl LogFollower {
    /// Start watching the file behind `tail`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if the watcher cannot be created or attached.
    pub fn new(tail: LogTail, debounce: Duration) -> Result<Self> {
        let dir = match tail.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = tail.path().file_name().map(ToOwned::to_owned);

        let (tx, changes) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let Ok(event) = result else {
                return;
            };
            let relevant = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) && event
                .paths
                .iter()
                .any(|path| path.file_name() == file_name.as_deref());
            if relevant {
                let _ = tx.send(());
            }
        })
        .map_err(|source| Error::Watch {
            path: dir.clone(),
            source,
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| Error::Watch {
                path: dir.clone(),
                source,
            })?;
        info!(path = %tail.path().display(), "watching log file");

        Ok(Self {
            tail,
            changes,
            debounce,
            _watcher: watcher,
        })
    }

    /// Block until the file changes, then return the lines completed since the last
    /// read. Returns an empty list when `timeout` passes with no change, or when the
    /// file is currently missing (mid-rotation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read, or [`Error::Watch`]
    /// if the watcher has stopped.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<Vec<String>> {
        let first = match timeout {
            Some(timeout) => self.changes.recv_timeout(timeout),
            None => self
                .changes
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };
        match first {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => return Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::Watch {
                    path: self.tail.path().to_path_buf(),
                    source: notify::Error::generic("watcher stopped delivering events"),
                });
            }
        }
        let deadline = Instant::now() + self.debounce;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            if self.changes.recv_timeout(left).is_err() {
                break;
            }
        }

        match self.tail.poll() {
            Err(Error::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %self.tail.path().display(), "log file missing, waiting");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Which clients follow which sections' logs.
pub struct Subscriptions {
    by_section: BTreeMap<String, BTreeSet<String>>,
}

impl Subscriptions {
    #[must_use]
    /// No subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `client` to `section`. Returns `false` if it already was, or if the
    /// section name is empty and so would match every line.
    pub fn subscribe(&mut self, client: &str, section: &str) -> bool {
        if section.is_empty() {
            debug!(client, "ignoring subscription to an empty section name");
            return false;
        }
        let added = self
            .by_section
            .entry(section.to_string())
            .or_default()
            .insert(client.to_string());
        if added {
            info!(client, section, "client subscribed to logs");
        }
        added
    }

    /// Unsubscribe `client` from `section`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, client: &str, section: &str) -> bool {
        let Some(clients) = self.by_section.get_mut(section) else {
            return false;
        };
        let removed = clients.remove(client);
        if clients.is_empty() {
            self.by_section.remove(section);
        }
        if removed {
            info!(client, section, "client unsubscribed from logs");
        }
        removed
    }

    /// Drop every subscription held by `client`, as on disconnect.
    pub fn remove_client(&mut self, client: &str) {
        self.by_section.retain(|_, clients| {
            clients.remove(client);
            !clients.is_empty()
        });
    }

    /// Clients subscribed to `section`.
    pub fn subscribers(&self, section: &str) -> impl Iterator<Item = &str> {
        self.by_section
            .get(section)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    #[must_use]
    /// Deliveries for one log line: a `new_log` event for each subscriber of each
    /// section named in the line.
    pub fn route(&self, line: &str) -> Vec<(String, RelayEvent)> {
        self.by_section
            .iter()
            .filter(|(section, _)| line.contains(section.as_str()))
            .flat_map(|(section, clients)| {
                clients.iter().map(move |client| {
                    (
                        client.clone(),
                        RelayEvent::NewLog {
                            section: section.clone(),
                            line: line.to_string(),
                        },
                    )
                })
            })
            .collect()
    }
}

#[must_use]
/// Lines that mention `section`, in order.
pub fn section_logs<'a, I>(lines: I, section: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| line.contains(section))
        .collect()
}

#[cfg(test)]
#[path = "tests/logs.rs"]
mod tests;
