//! Structured notifications handed to the text renderer.
//!
//! Nothing in this crate produces display strings. Every user-visible
//! message is a [`Notification`]: a message id, a level, an optional target
//! server and the ordered arguments the renderer substitutes into its
//! template for that id.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// Identifier of a message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageId {
    // server status listing
    ServerList,
    ServerLookupList,
    ServerReconnectList,
    NoConnectedServers,

    // setup commands
    SetupServerAdded,
    SetupServerRemoved,
    SetupServerNotFound,
    UnknownChatnet,
    ConnectRequested,
    CommandFailed,

    // chat network registry
    ChatnetAdded,
    ChatnetRemoved,
    ChatnetNotFound,
    ChatnetList,

    // connection lifecycle
    LookingUp,
    Connecting,
    Reconnecting,
    ConnectionEstablished,
    EncryptedConnectionEstablished,
    CantConnect,
    ConnectionLost,
    ServerQuit,
    LagDisconnected,
    ReconnectRemoved,
    ReconnectNotFound,
    UnknownChatProtocol,

    // verbose TLS report
    TlsServerCertHeader,
    TlsServerCertSubjectHeader,
    TlsServerCertIssuerHeader,
    TlsServerCertNamedEntry,
    TlsServerCertFingerprint,
    TlsServerPubkeySize,
    TlsServerEphemeralKey,
    TlsServerEphemeralKeyUnavailable,
}

/// Message level, used by the renderer for filtering and colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    ClientNotice,
    ClientError,
    /// Low-priority informational lines such as listings.
    Crap,
}

/// One template argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotificationArg {
    Str(String),
    Int(i64),
}

impl From<&str> for NotificationArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for NotificationArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<u16> for NotificationArg {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for NotificationArg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for NotificationArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Tag of the server window the message belongs to. `None` targets the
    /// general output.
    pub target: Option<String>,
    pub level: MessageLevel,
    pub id: MessageId,
    pub args: Vec<NotificationArg>,
}

impl Notification {
    pub fn new(id: MessageId, level: MessageLevel) -> Self {
        Self {
            target: None,
            level,
            id,
            args: Vec::new(),
        }
    }

    pub fn notice(id: MessageId) -> Self {
        Self::new(id, MessageLevel::ClientNotice)
    }

    pub fn error(id: MessageId) -> Self {
        Self::new(id, MessageLevel::ClientError)
    }

    pub fn to_server(mut self, tag: impl Into<String>) -> Self {
        self.target = Some(tag.into());
        self
    }

    pub fn arg(mut self, value: impl Into<NotificationArg>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Receiver of notifications, normally the text renderer.
pub trait NotificationSink {
    fn emit(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn emit(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn emit(&mut self, notification: Notification) {
        (**self).emit(notification);
    }
}

/// Recording sink whose clones share one buffer.
///
/// Useful when the emitting side must own its sink, e.g. a dispatcher
/// registered with the event registry, while the caller still reads back
/// what was emitted.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog(Rc<RefCell<Vec<Notification>>>);

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.0.borrow().iter().map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl NotificationSink for NotificationLog {
    fn emit(&mut self, notification: Notification) {
        self.0.borrow_mut().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let n = Notification::notice(MessageId::Connecting)
            .to_server("example")
            .arg("irc.example.org")
            .arg("")
            .arg(6667u16);
        assert_eq!(n.target.as_deref(), Some("example"));
        assert_eq!(n.level, MessageLevel::ClientNotice);
        assert_eq!(
            n.args,
            [
                NotificationArg::Str("irc.example.org".into()),
                NotificationArg::Str(String::new()),
                NotificationArg::Int(6667)
            ]
        );
    }

    #[test]
    fn test_log_clones_share_buffer() {
        let log = NotificationLog::new();
        let mut writer = log.clone();
        writer.emit(Notification::notice(MessageId::LookingUp));
        assert_eq!(log.ids(), [MessageId::LookingUp]);
        assert_eq!(log.take().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let n = Notification::error(MessageId::CantConnect)
            .arg("irc.example.org")
            .arg(6697u16);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["id"], "cant_connect");
        assert_eq!(json["level"], "client_error");
        assert_eq!(json["args"][1], 6697);
        assert!(json["target"].is_null());
    }
}
