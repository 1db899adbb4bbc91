//! Domain types shared by every chatlink crate: server setup entries, the
//! option map handed over by the command surface, the chat-protocol registry
//! and the configuration error taxonomy.

pub mod constants;
pub mod error;
pub mod options;
pub mod protocol;
pub mod types;

pub use error::ConfigError;
pub use options::OptionMap;
pub use protocol::{ChatProtocol, ChatnetLookup, ProtocolRegistry};
pub use types::{AddressFamily, ServerSetupEntry, TlsSettings};
