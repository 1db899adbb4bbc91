use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Address-family preference used when resolving the server address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[default]
    Unspecified,
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "unspecified" => Some(Self::Unspecified),
            "ipv4" => Some(Self::Ipv4),
            "ipv6" => Some(Self::Ipv6),
            _ => None,
        }
    }
}

/// Transport-security block of a server setup entry.
///
/// Path and string fields are `None` until explicitly set; an empty string is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    pub use_tls: bool,
    pub cert: Option<String>,
    pub pkey: Option<String>,
    pub pass: Option<String>,
    pub verify: bool,
    pub cafile: Option<String>,
    pub capath: Option<String>,
    pub ciphers: Option<String>,
    pub fingerprint: Option<String>,
}

impl TlsSettings {
    /// Derive the implied flags from the configured material.
    ///
    /// CA material implies peer verification, and a client certificate or
    /// peer verification implies TLS. The CA step must run first.
    pub fn apply_implications(&mut self) {
        if is_set(&self.cafile) || is_set(&self.capath) {
            self.verify = true;
        }
        if is_set(&self.cert) || self.verify {
            self.use_tls = true;
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// A persisted, user-defined connection profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSetupEntry {
    /// Store identifier.
    pub id: Uuid,
    /// Id of the chat protocol that created the entry.
    pub chat_type: u32,
    pub address: String,
    pub port: u16,
    /// Tag of the chat network this entry belongs to.
    pub chatnet: Option<String>,
    /// Nickname override.
    pub nick: Option<String>,
    pub password: Option<String>,
    pub family: AddressFamily,
    /// Local address to bind to.
    pub own_host: Option<String>,
    /// Resolved `own_host` caches, filled by the connection engine.
    #[serde(skip)]
    pub own_ip4: Option<IpAddr>,
    #[serde(skip)]
    pub own_ip6: Option<IpAddr>,
    pub autoconnect: bool,
    pub no_proxy: bool,
    pub tls: TlsSettings,
    /// Protocol-specific fields contributed by pre-persist hooks.
    pub extra: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl ServerSetupEntry {
    pub fn new(chat_type: u32, address: impl Into<String>, port: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_type,
            address: address.into(),
            port,
            chatnet: None,
            nick: None,
            password: None,
            family: AddressFamily::Unspecified,
            own_host: None,
            own_ip4: None,
            own_ip6: None,
            autoconnect: false,
            no_proxy: false,
            tls: TlsSettings::default(),
            extra: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Replace the bind host. The derived IP caches are always dropped.
    pub fn set_own_host(&mut self, host: Option<String>) {
        self.own_host = host;
        self.own_ip4 = None;
        self.own_ip6 = None;
    }

    /// Whether this entry answers a lookup for `address`, `port` and `chatnet`.
    ///
    /// Address and network compare case-insensitively. `None` for port or
    /// network matches any value.
    pub fn matches(&self, address: &str, port: Option<u16>, chatnet: Option<&str>) -> bool {
        if !self.address.eq_ignore_ascii_case(address) {
            return false;
        }
        if port.is_some_and(|p| p != self.port) {
            return false;
        }
        match chatnet {
            None => true,
            Some(net) => self
                .chatnet
                .as_deref()
                .is_some_and(|own| own.eq_ignore_ascii_case(net)),
        }
    }

    /// Whether this entry is the one stored under exactly this key.
    ///
    /// Unlike [`matches`](Self::matches), `None` only matches an entry
    /// without a network.
    pub fn has_key(&self, address: &str, port: u16, chatnet: Option<&str>) -> bool {
        self.address.eq_ignore_ascii_case(address)
            && self.port == port
            && match (chatnet, self.chatnet.as_deref()) {
                (None, None) => true,
                (Some(net), Some(own)) => own.eq_ignore_ascii_case(net),
                _ => false,
            }
    }
}
