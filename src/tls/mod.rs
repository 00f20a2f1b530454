pub mod listener;
pub mod selfsigned;

pub use listener::TlsListener;

use crate::config::{TlsConfig, TlsMode};
use rustls_pemfile::{certs, private_key};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_rustls::rustls::{self, pki_types::CertificateDer, ServerConfig};

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} contains no certificates", .0.display())]
    NoCertificates(PathBuf),

    #[error("{} contains no private key", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),

    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),
}

/// Resolve the TLS mode into a server config, generating a self-signed pair
/// first when asked to. `None` means plain HTTP.
pub fn prepare(tls: &TlsConfig) -> Result<Option<Arc<ServerConfig>>, TlsError> {
    match tls.mode {
        TlsMode::Off => Ok(None),
        TlsMode::Custom => load_server_config(&tls.cert_path(), &tls.key_path()).map(Some),
        TlsMode::SelfSigned => {
            selfsigned::ensure(tls)?;
            load_server_config(&tls.cert_path(), &tls.key_path()).map(Some)
        }
    }
}

/// Build a rustls server config from PEM certificate and key files.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<Arc<ServerConfig>, TlsError> {
    let mut cert_reader = open(cert_path)?;
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|source| TlsError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;

    if cert_chain.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let mut key_reader = open(key_path)?;
    let key = private_key(&mut key_reader)
        .map_err(|source| TlsError::Io {
            path: key_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.to_path_buf()))?;

    // Pin the provider; other dependencies may enable a second one.
    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_no_client_auth()
    .with_single_cert(cert_chain, key)?;

    Ok(Arc::new(config))
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })
}
