// Boundary types of the connection engine: connection records, the typed
// lifecycle event registry and TLS session introspection.

pub mod connection;
pub mod events;
pub mod tls;

pub use connection::{
    ConnectTarget, ConnectionContext, ConnectionSnapshot, ConnectionTracker, ReconnectEntry,
};
pub use events::{ConnectionEvent, ConnectionEventHandler, EventRegistry, HandlerId};
pub use tls::{
    inspect, CertificateNames, EphemeralKey, EphemeralKeyKind, KeyAlgorithm, NameEntry,
    PeerKeyInfo, TlsCertificateReport, TlsInspectError, TlsSession,
};
