//! Typed lifecycle events and the handler registry the engine emits them on.
//!
//! Handlers are called synchronously, in registration order, on the thread
//! that emits the event. Events borrow engine state for the duration of the
//! call only.

use std::net::IpAddr;

use tracing::trace;

use crate::connection::{ConnectionContext, ReconnectEntry};
use crate::tls::TlsSession;

/// Lifecycle events fired by the connection engine and reconnect scheduler.
#[derive(Clone, Copy)]
pub enum ConnectionEvent<'a> {
    /// DNS lookup started.
    Looking { server: &'a ConnectionContext },
    /// TCP connect started. `ip` is `None` when the address is not known yet.
    Connecting {
        server: &'a ConnectionContext,
        ip: Option<IpAddr>,
    },
    /// Connection established. `session` is present for TLS connections.
    Connected {
        server: &'a ConnectionContext,
        session: Option<&'a dyn TlsSession>,
    },
    /// Connect attempt failed. `None` means the failure was expected.
    ConnectFailed {
        server: &'a ConnectionContext,
        message: Option<&'a str>,
    },
    Disconnected { server: &'a ConnectionContext },
    /// We quit the server with `message`.
    Quit {
        server: &'a ConnectionContext,
        message: &'a str,
    },
    /// Dropped because the lag check went unanswered.
    LagDisconnect { server: &'a ConnectionContext },
    ReconnectRemoved { entry: &'a ReconnectEntry },
    ReconnectNotFound { tag: &'a str },
    UnknownChatProtocol { protocol: &'a str },
}

impl ConnectionEvent<'_> {
    /// Stable event identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Looking { .. } => "looking",
            Self::Connecting { .. } => "connecting",
            Self::Connected { .. } => "connected",
            Self::ConnectFailed { .. } => "connect_failed",
            Self::Disconnected { .. } => "disconnected",
            Self::Quit { .. } => "quit",
            Self::LagDisconnect { .. } => "lag_disconnect",
            Self::ReconnectRemoved { .. } => "reconnect_removed",
            Self::ReconnectNotFound { .. } => "reconnect_not_found",
            Self::UnknownChatProtocol { .. } => "unknown_chat_protocol",
        }
    }

    /// The server the event is about, if any.
    pub fn server(&self) -> Option<&ConnectionContext> {
        match *self {
            Self::Looking { server }
            | Self::Connecting { server, .. }
            | Self::Connected { server, .. }
            | Self::ConnectFailed { server, .. }
            | Self::Disconnected { server }
            | Self::Quit { server, .. }
            | Self::LagDisconnect { server } => Some(server),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ConnectionEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEvent")
            .field("name", &self.name())
            .field("server", &self.server().map(|s| s.tag.as_str()))
            .finish()
    }
}

/// Receiver of lifecycle events.
pub trait ConnectionEventHandler {
    fn handle(&mut self, event: &ConnectionEvent<'_>);
}

impl<F> ConnectionEventHandler for F
where
    F: FnMut(&ConnectionEvent<'_>),
{
    fn handle(&mut self, event: &ConnectionEvent<'_>) {
        (self)(event)
    }
}

/// Token returned by [`EventRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Handlers registered with the connection engine.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Vec<(HandlerId, Box<dyn ConnectionEventHandler>)>,
    next_id: u64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn ConnectionEventHandler>) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push((id, handler));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        self.handlers.len() != before
    }

    /// Deliver `event` to every handler, in registration order.
    pub fn emit(&mut self, event: &ConnectionEvent<'_>) {
        trace!(event = event.name(), handlers = self.handlers.len(), "Emitting event");
        for (_, handler) in self.handlers.iter_mut() {
            handler.handle(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::connection::ConnectTarget;

    fn test_server() -> ConnectionContext {
        ConnectionContext::new(
            "example",
            ConnectTarget {
                address: "irc.example.org".into(),
                port: 6667,
                chatnet: None,
                nick: "tester".into(),
                use_tls: false,
                reconnecting: false,
            },
        )
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();

        for label in ["first", "second"] {
            let seen = seen.clone();
            registry.register(Box::new(move |event: &ConnectionEvent<'_>| {
                seen.borrow_mut().push(format!("{label}:{}", event.name()));
            }));
        }

        let server = test_server();
        registry.emit(&ConnectionEvent::Looking { server: &server });
        registry.emit(&ConnectionEvent::Disconnected { server: &server });

        assert_eq!(
            *seen.borrow(),
            [
                "first:looking",
                "second:looking",
                "first:disconnected",
                "second:disconnected"
            ]
        );
    }

    #[test]
    fn test_unregister() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = EventRegistry::new();
        let c = count.clone();
        let id = registry.register(Box::new(move |_: &ConnectionEvent<'_>| {
            *c.borrow_mut() += 1;
        }));

        registry.emit(&ConnectionEvent::ReconnectNotFound { tag: "RECON-9" });
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        registry.emit(&ConnectionEvent::ReconnectNotFound { tag: "RECON-9" });

        assert_eq!(*count.borrow(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_event_server_accessor() {
        let server = test_server();
        let event = ConnectionEvent::Quit {
            server: &server,
            message: "bye",
        };
        assert_eq!(event.server().map(|s| s.tag.as_str()), Some("example"));
        assert!(ConnectionEvent::UnknownChatProtocol { protocol: "SILC" }
            .server()
            .is_none());
    }
}
