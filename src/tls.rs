//! TLS acceptor construction from PEM files.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig as RustlsConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};

/// Locations of the certificate, its optional intermediate chain and the
/// private key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TlsFiles {
    pub certificate: PathBuf,
    #[serde(default)]
    pub chain: Option<PathBuf>,
    pub private_key: PathBuf,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading certificates from {}", path.display()))?;

    if certs.is_empty() {
        anyhow::bail!("no certificates found in {}", path.display());
    }
    Ok(certs)
}

pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut open(path)?)
        .with_context(|| format!("reading private key from {}", path.display()))?
        .with_context(|| format!("no private key found in {}", path.display()))
}

/// Builds the acceptor: leaf certificate first, then the chain.
pub fn load_acceptor(files: &TlsFiles) -> Result<TlsAcceptor> {
    let mut certs = load_certificates(&files.certificate)?;
    if let Some(chain) = &files.chain {
        certs.extend(load_certificates(chain)?);
    }
    let key = load_private_key(&files.private_key)?;

    let mut config = RustlsConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("building TLS configuration")?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    tracing::info!(certificate = %files.certificate.display(), "TLS configuration loaded");
    Ok(TlsAcceptor::from(Arc::new(config)))
}
