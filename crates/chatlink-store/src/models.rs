//! Records persisted next to the server setup entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered chat network that setup entries can be grouped under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chatnet {
    /// Network tag, unique case-insensitively.
    pub name: String,
    /// Id of the chat protocol the network speaks.
    pub chat_type: u32,
    /// Default nickname for servers of this network.
    pub nick: Option<String>,
    pub created_at: DateTime<Utc>,
}
