//! Connection records owned by the connection engine.
//!
//! The engine keeps three ordered collections: established servers, servers
//! still looking up or connecting, and pending reconnects. Readers never get
//! a live alias to them, only a [`ConnectionSnapshot`] cloned at call time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use chatlink_shared::ServerSetupEntry;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectTarget {
    pub address: String,
    pub port: u16,
    /// Chat network tag, if the target belongs to one.
    pub chatnet: Option<String>,
    pub nick: String,
    pub use_tls: bool,
    /// Set when this attempt is a reconnect of an earlier connection.
    pub reconnecting: bool,
}

impl ConnectTarget {
    /// Build a target from a stored setup entry. The entry's nickname
    /// override wins over `default_nick`.
    pub fn from_setup(entry: &ServerSetupEntry, default_nick: &str) -> Self {
        Self {
            address: entry.address.clone(),
            port: entry.port,
            chatnet: entry.chatnet.clone(),
            nick: entry
                .nick
                .clone()
                .unwrap_or_else(|| default_nick.to_string()),
            use_tls: entry.tls.use_tls,
            reconnecting: false,
        }
    }

    /// Network tag for display, empty when there is none.
    pub fn chatnet_or_empty(&self) -> &str {
        self.chatnet.as_deref().unwrap_or("")
    }
}

/// A server connection as seen by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionContext {
    /// Unique server tag, e.g. `"libera"`.
    pub tag: String,
    pub target: ConnectTarget,
    /// When the last lag check was sent.
    pub lag_sent: Option<DateTime<Utc>>,
}

impl ConnectionContext {
    pub fn new(tag: impl Into<String>, target: ConnectTarget) -> Self {
        Self {
            tag: tag.into(),
            target,
            lag_sent: None,
        }
    }
}

/// A reconnect scheduled by the reconnection scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconnectEntry {
    pub tag: u32,
    pub target: ConnectTarget,
    pub next_attempt: DateTime<Utc>,
}

impl ReconnectEntry {
    /// Tag as users type it in `reconnect` commands.
    pub fn display_tag(&self) -> String {
        format!("RECON-{}", self.tag)
    }
}

/// Read-only copy of the engine's collections, in their iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub servers: Vec<ConnectionContext>,
    pub lookups: Vec<ConnectionContext>,
    pub reconnects: Vec<ReconnectEntry>,
}

impl ConnectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.lookups.is_empty() && self.reconnects.is_empty()
    }
}

/// Insertion-ordered owner of the three connection collections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    servers: Vec<ConnectionContext>,
    lookups: Vec<ConnectionContext>,
    reconnects: Vec<ReconnectEntry>,
    next_reconnect_tag: u32,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server that started looking up its address.
    pub fn begin_lookup(&mut self, server: ConnectionContext) {
        debug!(tag = %server.tag, addr = %server.target.address, "Tracking lookup");
        self.lookups.push(server);
    }

    /// Move a server from the lookup list to the connected list.
    ///
    /// Returns `false` if no lookup with that tag exists.
    pub fn mark_connected(&mut self, tag: &str) -> bool {
        let Some(pos) = self.lookups.iter().position(|s| s.tag == tag) else {
            return false;
        };
        let server = self.lookups.remove(pos);
        debug!(tag = %server.tag, "Lookup finished, server connected");
        self.servers.push(server);
        true
    }

    /// Drop a server from whichever list holds it.
    pub fn remove_server(&mut self, tag: &str) -> Option<ConnectionContext> {
        let removed =
            take_by_tag(&mut self.servers, tag).or_else(|| take_by_tag(&mut self.lookups, tag));
        if removed.is_some() {
            debug!(tag, "Removed server from tracker");
        }
        removed
    }

    /// Record the time a lag check was sent to `tag`.
    pub fn record_lag_sent(&mut self, tag: &str, at: DateTime<Utc>) -> bool {
        match self.servers.iter_mut().find(|s| s.tag == tag) {
            Some(server) => {
                server.lag_sent = Some(at);
                true
            }
            None => false,
        }
    }

    /// Queue a reconnect and return its numeric tag.
    pub fn schedule_reconnect(
        &mut self,
        mut target: ConnectTarget,
        next_attempt: DateTime<Utc>,
    ) -> u32 {
        self.next_reconnect_tag += 1;
        let tag = self.next_reconnect_tag;
        target.reconnecting = true;
        debug!(tag, addr = %target.address, %next_attempt, "Scheduled reconnect");
        self.reconnects.push(ReconnectEntry {
            tag,
            target,
            next_attempt,
        });
        tag
    }

    /// Remove a pending reconnect by its `RECON-n` or bare numeric tag.
    pub fn remove_reconnect(&mut self, tag: &str) -> Option<ReconnectEntry> {
        let number: u32 = tag
            .strip_prefix("RECON-")
            .unwrap_or(tag)
            .parse()
            .ok()?;
        let pos = self.reconnects.iter().position(|r| r.tag == number)?;
        Some(self.reconnects.remove(pos))
    }

    pub fn server(&self, tag: &str) -> Option<&ConnectionContext> {
        self.servers
            .iter()
            .chain(self.lookups.iter())
            .find(|s| s.tag == tag)
    }

    /// Clone all three collections as they are right now.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            servers: self.servers.clone(),
            lookups: self.lookups.clone(),
            reconnects: self.reconnects.clone(),
        }
    }
}

fn take_by_tag(list: &mut Vec<ConnectionContext>, tag: &str) -> Option<ConnectionContext> {
    let pos = list.iter().position(|s| s.tag == tag)?;
    Some(list.remove(pos))
}
