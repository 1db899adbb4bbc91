//! TLS session introspection.
//!
//! [`inspect`] turns a completed handshake into a [`TlsCertificateReport`]:
//! negotiated version and cipher, the peer's certificate chain as ordered
//! distinguished-name entries, the peer key and its SHA-256 fingerprint, and
//! the server's ephemeral key where the session can tell.
//!
//! Extraction never fails once a session is present. Fields that cannot be
//! read are left empty and logged.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;
use x509_parser::certificate::X509Certificate;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::parse_x509_certificate;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::X509Name;

/// Read access to a finished TLS handshake.
///
/// Certificates are handed out DER-encoded.
pub trait TlsSession {
    /// Negotiated protocol version, e.g. `"TLSv1.3"`.
    fn tls_version(&self) -> Option<String>;

    /// Negotiated cipher suite name.
    fn cipher_name(&self) -> Option<String>;

    /// The peer's end-entity certificate.
    fn peer_certificate_der(&self) -> Option<Vec<u8>>;

    /// The chain the peer presented, end-entity first.
    fn peer_chain_der(&self) -> Option<Vec<Vec<u8>>>;

    /// Whether this session type can report the server's ephemeral key.
    fn supports_ephemeral_key(&self) -> bool {
        false
    }

    fn ephemeral_key(&self) -> Option<EphemeralKey> {
        None
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlsInspectError {
    #[error("Connection has no TLS session")]
    NoSession,
}

/// One attribute of a distinguished name, e.g. `CN=irc.example.org`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameEntry {
    pub name: String,
    pub value: String,
}

/// Subject and issuer of one certificate, in certificate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateNames {
    pub subject: Vec<NameEntry>,
    pub issuer: Vec<NameEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyAlgorithm {
    Rsa,
    Dsa,
    Unknown,
}

impl KeyAlgorithm {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Dsa => "DSA",
            Self::Unknown => "Unknown",
        }
    }
}

/// The peer certificate's long-term key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerKeyInfo {
    pub algorithm: KeyAlgorithm,
    /// Key size in bits, `None` if the key could not be parsed.
    pub bits: Option<u32>,
    /// Uppercase, colon-separated SHA-256 of the DER certificate.
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EphemeralKeyKind {
    Rsa,
    Dh,
    /// Elliptic-curve key on the named curve, e.g. `prime256v1`.
    Ecdh { curve: String },
    Other(String),
}

/// Key generated by the server for this handshake only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EphemeralKey {
    pub kind: EphemeralKeyKind,
    pub bits: u32,
}

impl EphemeralKey {
    /// Display label: `"RSA"`, `"DH"` or `"ECDH: <curve>"`.
    pub fn label(&self) -> String {
        match &self.kind {
            EphemeralKeyKind::Rsa => "RSA".to_string(),
            EphemeralKeyKind::Dh => "DH".to_string(),
            EphemeralKeyKind::Ecdh { curve } => format!("ECDH: {curve}"),
            EphemeralKeyKind::Other(name) => name.clone(),
        }
    }
}

/// Everything worth telling the user about a fresh TLS connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsCertificateReport {
    pub protocol_version: Option<String>,
    pub cipher: Option<String>,
    /// Peer chain in presentation order; empty when the peer sent none.
    pub chain: Vec<CertificateNames>,
    pub peer_key: Option<PeerKeyInfo>,
    /// Whether the session could report an ephemeral key at all.
    pub ephemeral_key_supported: bool,
    pub ephemeral_key: Option<EphemeralKey>,
}

/// Build a report from a completed handshake.
pub fn inspect(session: Option<&dyn TlsSession>) -> Result<TlsCertificateReport, TlsInspectError> {
    let session = session.ok_or(TlsInspectError::NoSession)?;

    let chain = session
        .peer_chain_der()
        .unwrap_or_default()
        .iter()
        .filter_map(|der| certificate_names(der))
        .collect();

    let peer_key = session.peer_certificate_der().map(|der| peer_key_info(&der));

    let ephemeral_key_supported = session.supports_ephemeral_key();
    let ephemeral_key = if ephemeral_key_supported {
        session.ephemeral_key()
    } else {
        None
    };

    Ok(TlsCertificateReport {
        protocol_version: session.tls_version(),
        cipher: session.cipher_name(),
        chain,
        peer_key,
        ephemeral_key_supported,
        ephemeral_key,
    })
}

/// Subject and issuer entries of a DER certificate.
pub fn certificate_names(der: &[u8]) -> Option<CertificateNames> {
    let cert = parse_certificate(der)?;
    Some(CertificateNames {
        subject: name_entries(cert.subject()),
        issuer: name_entries(cert.issuer()),
    })
}

/// Key algorithm, size and fingerprint of a DER certificate.
///
/// The fingerprint is computed over the raw bytes, so it is available even
/// when the certificate does not parse.
pub fn peer_key_info(der: &[u8]) -> PeerKeyInfo {
    let fingerprint = fingerprint_sha256(der);

    let Some(cert) = parse_certificate(der) else {
        return PeerKeyInfo {
            algorithm: KeyAlgorithm::Unknown,
            bits: None,
            fingerprint,
        };
    };

    let (algorithm, bits) = match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => (KeyAlgorithm::Rsa, bit_length(rsa.modulus)),
        Ok(key @ PublicKey::DSA(_)) => (KeyAlgorithm::Dsa, non_zero(key.key_size())),
        Ok(key) => (KeyAlgorithm::Unknown, non_zero(key.key_size())),
        Err(e) => {
            warn!(error = %e, "Unreadable peer public key");
            (KeyAlgorithm::Unknown, None)
        }
    };

    PeerKeyInfo {
        algorithm,
        bits,
        fingerprint,
    }
}

/// SHA-256 over `der`, as uppercase hex pairs joined with `:`.
pub fn fingerprint_sha256(der: &[u8]) -> String {
    let digest = hex::encode_upper(Sha256::digest(der));
    let mut out = String::with_capacity(digest.len() / 2 * 3);
    for (i, pair) in digest.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.extend(pair.iter().map(|&b| char::from(b)));
    }
    out
}

fn parse_certificate(der: &[u8]) -> Option<X509Certificate<'_>> {
    match parse_x509_certificate(der) {
        Ok((_, cert)) => Some(cert),
        Err(e) => {
            warn!(error = %e, len = der.len(), "Failed to parse peer certificate");
            None
        }
    }
}

fn name_entries(name: &X509Name<'_>) -> Vec<NameEntry> {
    name.iter_attributes()
        .map(|attr| {
            let oid = attr.attr_type();
            let name = oid2abbrev(oid, oid_registry())
                .map(str::to_string)
                .unwrap_or_else(|_| oid.to_id_string());
            let value = match attr.as_str() {
                Ok(s) => s.to_string(),
                Err(_) => String::from_utf8_lossy(attr.attr_value().as_bytes()).into_owned(),
            };
            NameEntry { name, value }
        })
        .collect()
}

/// Bit length of a big-endian unsigned integer.
fn bit_length(bytes: &[u8]) -> Option<u32> {
    let start = bytes.iter().position(|&b| b != 0)?;
    let effective = &bytes[start..];
    let high_bits = 8 - effective[0].leading_zeros();
    Some(high_bits + (effective.len() as u32 - 1) * 8)
}

fn non_zero(bits: usize) -> Option<u32> {
    (bits > 0).then_some(bits as u32)
}

#[cfg(feature = "rustls")]
mod rustls_session {
    use rustls::{ClientConnection, ProtocolVersion};

    use super::TlsSession;

    fn version_label(version: ProtocolVersion) -> String {
        match version {
            ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
            ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
            other => format!("{other:?}"),
        }
    }


    impl TlsSession for ClientConnection {
        fn tls_version(&self) -> Option<String> {
            self.protocol_version().map(version_label)
        }

        fn cipher_name(&self) -> Option<String> {
            self.negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite()))
        }

        fn peer_certificate_der(&self) -> Option<Vec<u8>> {
            self.peer_certificates()
                .and_then(|certs| certs.first())
                .map(|cert| cert.as_ref().to_vec())
        }

        fn peer_chain_der(&self) -> Option<Vec<Vec<u8>>> {
            self.peer_certificates()
                .map(|certs| certs.iter().map(|cert| cert.as_ref().to_vec()).collect())
        }
    }
}
