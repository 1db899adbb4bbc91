//! Turns connection lifecycle events into notifications.
//!
//! The dispatcher keeps no per-connection state. Each event is handled on its
//! own, in the order the engine emits them.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};

use chatlink_net::{
    inspect, ConnectionContext, ConnectionEvent, ConnectionEventHandler, EphemeralKeyKind,
    TlsCertificateReport, TlsInspectError, TlsSession,
};
use chatlink_shared::constants::FINGERPRINT_DIGEST;

use crate::notify::{MessageId, Notification, NotificationSink};
use crate::settings::FrontendSettings;

const UNAVAILABLE: &str = "unavailable";

/// Broken contract between the connection engine and the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Server {tag} connected with TLS but without a session")]
    MissingTlsSession { tag: String },
}

pub struct ConnectionEventDispatcher<S> {
    sink: S,
    settings: FrontendSettings,
}

impl<S: NotificationSink> ConnectionEventDispatcher<S> {
    pub fn new(sink: S, settings: FrontendSettings) -> Self {
        Self { sink, settings }
    }

    /// Handle one event. `now` is used for elapsed-time arguments.
    pub fn dispatch_at(
        &mut self,
        event: &ConnectionEvent<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        debug!(event = event.name(), "Dispatching connection event");

        match *event {
            ConnectionEvent::Looking { server } => {
                self.server_notice(server, MessageId::LookingUp, |n| {
                    n.arg(server.target.address.as_str())
                });
            }
            ConnectionEvent::Connecting { server, ip } => {
                let id = if server.target.reconnecting {
                    MessageId::Reconnecting
                } else {
                    MessageId::Connecting
                };
                let ip = ip.map(|ip| ip.to_string()).unwrap_or_default();
                self.server_notice(server, id, |n| {
                    n.arg(server.target.address.as_str())
                        .arg(ip)
                        .arg(server.target.port)
                });
            }
            ConnectionEvent::Connected { server, session } => {
                if server.target.use_tls {
                    self.connected_tls(server, session)?;
                } else {
                    self.server_notice(server, MessageId::ConnectionEstablished, |n| {
                        n.arg(server.target.address.as_str())
                    });
                }
            }
            ConnectionEvent::ConnectFailed { server, message } => {
                match message.filter(|m| !m.is_empty()) {
                    Some(message) => self.sink.emit(
                        Notification::error(MessageId::CantConnect)
                            .to_server(server.tag.as_str())
                            .arg(server.target.address.as_str())
                            .arg(server.target.port)
                            .arg(message),
                    ),
                    None => self.connection_lost(server),
                }
            }
            ConnectionEvent::Disconnected { server } => self.connection_lost(server),
            ConnectionEvent::Quit { server, message } => {
                self.server_notice(server, MessageId::ServerQuit, |n| {
                    n.arg(server.target.address.as_str()).arg(message)
                });
            }
            ConnectionEvent::LagDisconnect { server } => {
                let elapsed = server
                    .lag_sent
                    .map(|sent| (now - sent).num_seconds())
                    .unwrap_or(0);
                self.server_notice(server, MessageId::LagDisconnected, |n| {
                    n.arg(server.target.address.as_str()).arg(elapsed)
                });
            }
            ConnectionEvent::ReconnectRemoved { entry } => self.sink.emit(
                Notification::notice(MessageId::ReconnectRemoved)
                    .arg(entry.target.address.as_str())
                    .arg(entry.target.port)
                    .arg(entry.target.chatnet_or_empty()),
            ),
            ConnectionEvent::ReconnectNotFound { tag } => {
                self.sink
                    .emit(Notification::notice(MessageId::ReconnectNotFound).arg(tag));
            }
            ConnectionEvent::UnknownChatProtocol { protocol } => {
                self.sink
                    .emit(Notification::error(MessageId::UnknownChatProtocol).arg(protocol));
            }
        }
        Ok(())
    }

    fn server_notice(
        &mut self,
        server: &ConnectionContext,
        id: MessageId,
        build: impl FnOnce(Notification) -> Notification,
    ) {
        let notification = build(Notification::notice(id).to_server(server.tag.as_str()));
        self.sink.emit(notification);
    }

    fn connection_lost(&mut self, server: &ConnectionContext) {
        self.server_notice(server, MessageId::ConnectionLost, |n| {
            n.arg(server.target.address.as_str())
        });
    }

    fn connected_tls(
        &mut self,
        server: &ConnectionContext,
        session: Option<&dyn TlsSession>,
    ) -> Result<(), DispatchError> {
        let report = match inspect(session) {
            Ok(report) => report,
            Err(TlsInspectError::NoSession) => {
                return Err(DispatchError::MissingTlsSession {
                    tag: server.tag.clone(),
                })
            }
        };

        self.server_notice(server, MessageId::EncryptedConnectionEstablished, |n| {
            n.arg(server.target.address.as_str())
                .arg(report.protocol_version.as_deref().unwrap_or(UNAVAILABLE))
                .arg(report.cipher.as_deref().unwrap_or(UNAVAILABLE))
        });

        if self.settings.tls_connect_verbose {
            self.certificate_details(server, &report);
        }
        Ok(())
    }

    fn certificate_details(&mut self, server: &ConnectionContext, report: &TlsCertificateReport) {
        let tag = server.tag.as_str();
        let mut emit = |n: Notification| self.sink.emit(n.to_server(tag));

        if !report.chain.is_empty() {
            emit(Notification::notice(MessageId::TlsServerCertHeader));
            for cert in &report.chain {
                emit(Notification::notice(MessageId::TlsServerCertSubjectHeader));
                for entry in &cert.subject {
                    emit(
                        Notification::notice(MessageId::TlsServerCertNamedEntry)
                            .arg(entry.name.as_str())
                            .arg(entry.value.as_str()),
                    );
                }
                emit(Notification::notice(MessageId::TlsServerCertIssuerHeader));
                for entry in &cert.issuer {
                    emit(
                        Notification::notice(MessageId::TlsServerCertNamedEntry)
                            .arg(entry.name.as_str())
                            .arg(entry.value.as_str()),
                    );
                }
            }
        }

        if let Some(key) = &report.peer_key {
            emit(
                Notification::notice(MessageId::TlsServerCertFingerprint)
                    .arg(key.fingerprint.as_str())
                    .arg(FINGERPRINT_DIGEST),
            );
            emit(
                Notification::notice(MessageId::TlsServerPubkeySize)
                    .arg(key.bits.unwrap_or(0))
                    .arg(key.algorithm.label()),
            );
        }

        if report.ephemeral_key_supported {
            match &report.ephemeral_key {
                Some(key) if matches!(key.kind, EphemeralKeyKind::Other(_)) => {
                    debug!(kind = ?key.kind, "Ephemeral key of unreported type");
                }
                Some(key) => emit(
                    Notification::notice(MessageId::TlsServerEphemeralKey)
                        .arg(key.bits)
                        .arg(key.label()),
                ),
                None => emit(Notification::notice(
                    MessageId::TlsServerEphemeralKeyUnavailable,
                )),
            }
        }
    }
}

impl<S: NotificationSink> ConnectionEventHandler for ConnectionEventDispatcher<S> {
    fn handle(&mut self, event: &ConnectionEvent<'_>) {
        if let Err(e) = self.dispatch_at(event, Utc::now()) {
            error!(event = event.name(), error = %e, "Connection event violated its contract");
        }
    }
}
