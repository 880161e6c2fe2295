//! Live endpoint status kept for the relay.
//!
//! The relay owns one [`MonitorState`] and hands it by reference to whatever receives
//! manager events and broadcasts to clients. Manager events arrive already decoded as
//! [`ManagerEvent`]; each one updates the state and yields the [`RelayEvent`] that
//! clients should see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Registration state of an endpoint.
pub enum Registration {
    /// A contact is reachable.
    Online,
    /// The contact is unreachable or was removed.
    Offline,
    /// No contact status has been seen yet.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// What the relay knows about one endpoint.
pub struct EndpointState {
    /// Last registration state seen.
    pub status: Registration,
    /// Channels currently up for the endpoint.
    pub calls: u32,
    /// When the endpoint last produced an event.
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
/// Manager events the relay reacts to, already decoded from the wire.
pub enum ManagerEvent {
    /// Connection to the manager interface established.
    Connect,
    /// Connection to the manager interface lost.
    Disconnect,
    /// A contact's reachability changed.
    ContactStatus {
        /// Contact URI, such as `sip:6001@10.0.0.5:5060`.
        #[serde(default)]
        uri: Option<String>,
        /// Reported status, such as `Reachable`.
        #[serde(rename = "contactstatus")]
        status: String,
    },
    /// A channel was created.
    NewChannel {
        /// Channel name, such as `PJSIP/6001-00000001`.
        channel: String,
    },
    /// A channel was hung up.
    Hangup {
        /// Channel name.
        channel: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
/// Event broadcast to connected clients.
pub enum RelayEvent {
    /// An endpoint's registration or call count changed.
    EndpointStatus {
        /// Endpoint name.
        endpoint: String,
        /// Current registration state.
        status: Registration,
        /// Current call count.
        calls: u32,
    },
    /// The manager connection went up or down.
    AmiStatus {
        /// Whether the manager interface is connected.
        connected: bool,
    },
    /// A log line for subscribers of a section.
    NewLog {
        /// Section the subscriber asked for.
        section: String,
        /// The log line.
        line: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
/// Point-in-time view of the monitor, as served by the status route.
pub struct StatusSnapshot {
    /// Whether the manager interface is connected.
    pub ami_connected: bool,
    /// When the state last changed.
    pub last_update: DateTime<Utc>,
    /// Per-endpoint state, ordered by name.
    pub endpoints: BTreeMap<String, EndpointState>,
}

#[derive(Debug, Clone)]
/// Endpoint registrations, call counts and manager connection state.
pub struct MonitorState {
    endpoints: BTreeMap<String, EndpointState>,
    connected: bool,
    last_update: DateTime<Utc>,
}

impl MonitorState {
    #[must_use]
    /// Empty state, disconnected, stamped with `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            endpoints: BTreeMap::new(),
            connected: false,
            last_update: now,
        }
    }

    #[must_use]
    /// Whether the manager interface is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    /// State of one endpoint.
    pub fn endpoint(&self, name: &str) -> Option<&EndpointState> {
        self.endpoints.get(name)
    }

    /// Record the manager connection going up or down.
    pub fn set_connected(&mut self, connected: bool, now: DateTime<Utc>) -> RelayEvent {
        self.connected = connected;
        self.last_update = now;
        info!(connected, "manager connection changed");
        RelayEvent::AmiStatus { connected }
    }

    /// Fold one manager event into the state.
    ///
    /// Returns the event to broadcast, or `None` when the event does not concern a
    /// PJSIP endpoint.
    pub fn apply(&mut self, event: ManagerEvent, now: DateTime<Utc>) -> Option<RelayEvent> {
        match event {
            ManagerEvent::Connect => Some(self.set_connected(true, now)),
            ManagerEvent::Disconnect => Some(self.set_connected(false, now)),
            ManagerEvent::ContactStatus { uri, status } => {
                let endpoint = uri
                    .as_deref()
                    .map_or_else(|| "unknown".to_string(), endpoint_from_uri);
                let status = if status.eq_ignore_ascii_case("reachable") {
                    Registration::Online
                } else {
                    Registration::Offline
                };
                Some(self.update(endpoint, now, |state| state.status = status))
            }
            ManagerEvent::NewChannel { channel } => {
                let endpoint = endpoint_from_channel(&channel)?;
                Some(self.update(endpoint.to_string(), now, |state| {
                    state.calls = state.calls.saturating_add(1);
                }))
            }
            ManagerEvent::Hangup { channel } => {
                let endpoint = endpoint_from_channel(&channel)?;
                Some(self.update(endpoint.to_string(), now, |state| {
                    state.calls = state.calls.saturating_sub(1);
                }))
            }
        }
    }

    fn update<F>(&mut self, endpoint: String, now: DateTime<Utc>, change: F) -> RelayEvent
    where
        F: FnOnce(&mut EndpointState),
    {
        let state = self
            .endpoints
            .entry(endpoint.clone())
            .or_insert_with(|| EndpointState {
                status: Registration::Unknown,
                calls: 0,
                last_seen: now,
            });
        change(state);
        state.last_seen = now;
        self.last_update = now;

        debug!(
            endpoint = %endpoint,
            status = ?state.status,
            calls = state.calls,
            "endpoint updated"
        );
        RelayEvent::EndpointStatus {
            status: state.status,
            calls: state.calls,
            endpoint,
        }
    }

    #[must_use]
    /// Serialisable view of the whole state.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ami_connected: self.connected,
            last_update: self.last_update,
            endpoints: self.endpoints.clone(),
        }
    }

    #[must_use]
    /// Events that bring a newly connected client up to date: the connection state,
    /// then one status per endpoint.
    pub fn replay(&self) -> Vec<RelayEvent> {
        let mut events = Vec::with_capacity(self.endpoints.len() + 1);
        events.push(RelayEvent::AmiStatus {
            connected: self.connected,
        });
        events.extend(
            self.endpoints
                .iter()
                .map(|(endpoint, state)| RelayEvent::EndpointStatus {
                    endpoint: endpoint.clone(),
                    status: state.status,
                    calls: state.calls,
                }),
        );
        events
    }
}

#[must_use]
/// Endpoint name in a contact URI: the user part, without a `sip:` scheme.
pub fn endpoint_from_uri(uri: &str) -> String {
    let user = uri.split('@').next().unwrap_or(uri);
    user.replacen("sip:", "", 1)
}

#[must_use]
/// Endpoint name in a PJSIP channel name, `PJSIP/NAME-suffix`.
pub fn endpoint_from_channel(channel: &str) -> Option<&str> {
    let start = channel.find("PJSIP/")? + "PJSIP/".len();
    let rest = &channel[start..];
    let end = rest.find(['-', '/']).unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
#[path = "tests/monitor.rs"]
mod tests;
