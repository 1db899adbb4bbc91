use thiserror::Error;

/// Rejections produced while resolving a server setup entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown chat network: {0}")]
    UnknownChatnet(String),

    #[error("No chat protocol could be determined and no default is registered")]
    NoChatProtocol,

    #[error("Not enough parameters given")]
    NotEnoughParams,

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// The network registry could not be read.
    #[error("Chat network lookup failed: {0}")]
    ChatnetLookupFailed(String),
}
