//! Registry of chat protocols known to the client.
//!
//! Every protocol names the option key under which `server add` receives its
//! chat network, which is how a protocol is picked from an option set.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHAT_PROTOCOL, NETWORK_OPTION};
use crate::error::ConfigError;
use crate::options::OptionMap;

/// Answers whether a chat network tag is registered.
pub trait ChatnetLookup {
    /// Fails with [`ConfigError::ChatnetLookupFailed`] when the registry
    /// cannot be read.
    fn chatnet_exists(&self, name: &str) -> Result<bool, ConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatProtocol {
    pub id: u32,
    pub name: String,
    /// Option key carrying this protocol's network tag.
    pub chatnet_option: String,
}

/// Ordered set of protocols plus the process-wide default.
#[derive(Debug, Clone, Default)]
pub struct ProtocolRegistry {
    protocols: Vec<ChatProtocol>,
    default_id: Option<u32>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the IRC protocol, which is also the default.
    pub fn with_default_protocol() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_CHAT_PROTOCOL, NETWORK_OPTION);
        registry.set_default(DEFAULT_CHAT_PROTOCOL);
        registry
    }

    /// Register a protocol and return its id. Re-registering a name returns
    /// the existing id.
    pub fn register(&mut self, name: &str, chatnet_option: &str) -> u32 {
        if let Some(existing) = self.find_by_name(name) {
            return existing.id;
        }
        let id = self.protocols.len() as u32 + 1;
        self.protocols.push(ChatProtocol {
            id,
            name: name.to_string(),
            chatnet_option: chatnet_option.to_string(),
        });
        id
    }

    /// Make `name` the default protocol. Returns `false` if it is unknown.
    pub fn set_default(&mut self, name: &str) -> bool {
        match self.find_by_name(name).map(|p| p.id) {
            Some(id) => {
                self.default_id = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn default_protocol(&self) -> Option<&ChatProtocol> {
        self.default_id.and_then(|id| self.find_by_id(id))
    }

    pub fn find_by_id(&self, id: u32) -> Option<&ChatProtocol> {
        self.protocols.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ChatProtocol> {
        self.protocols
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// First protocol whose network option is present in `options`.
    pub fn find_net(&self, options: &OptionMap) -> Option<&ChatProtocol> {
        self.protocols
            .iter()
            .find(|p| options.contains(&p.chatnet_option))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatProtocol> {
        self.protocols.iter()
    }
}
