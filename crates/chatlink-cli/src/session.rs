//! TLS session backed by DER certificate files on disk.

use std::path::Path;

use anyhow::{bail, Context};

use chatlink_net::TlsSession;

/// Peer chain loaded from files, end-entity first. Version and cipher are
/// not known offline.
#[derive(Debug, Clone)]
pub struct CertificateFiles {
    chain: Vec<Vec<u8>>,
}

impl CertificateFiles {
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Self> {
        if paths.is_empty() {
            bail!("At least one certificate file is needed");
        }
        let chain = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { chain })
    }
}

impl TlsSession for CertificateFiles {
    fn tls_version(&self) -> Option<String> {
        None
    }

    fn cipher_name(&self) -> Option<String> {
        None
    }

    fn peer_certificate_der(&self) -> Option<Vec<u8>> {
        self.chain.first().cloned()
    }

    fn peer_chain_der(&self) -> Option<Vec<Vec<u8>>> {
        Some(self.chain.clone())
    }
}
