use super::TlsError;
use crate::config::TlsConfig;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, KeyPair,
    KeyUsagePurpose,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use time::{Duration, OffsetDateTime};
use tracing::info;

pub const VALIDITY_DAYS: i64 = 365;

/// A freshly generated certificate and its private key, both PEM encoded.
pub struct GeneratedPair {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generate a server certificate covering `hosts`. IP literals become IP
/// subject alternative names, everything else a DNS name.
pub fn generate(hosts: &[String]) -> Result<GeneratedPair, TlsError> {
    let mut params = CertificateParams::new(hosts.to_vec())?;

    let mut name = DistinguishedName::new();
    name.push(DnType::OrganizationName, "traildash");
    if let Some(first) = hosts.first() {
        name.push(DnType::CommonName, first.as_str());
    }
    params.distinguished_name = name;

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(VALIDITY_DAYS);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    Ok(GeneratedPair {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Write a new pair into the TLS directory unless both files already exist.
/// Returns whether anything was generated.
pub fn ensure(tls: &TlsConfig) -> Result<bool, TlsError> {
    let cert_path = tls.cert_path();
    let key_path = tls.key_path();

    if cert_path.exists() && key_path.exists() {
        return Ok(false);
    }

    fs::create_dir_all(&tls.dir).map_err(|source| TlsError::Io {
        path: tls.dir.clone(),
        source,
    })?;

    let pair = generate(&tls.hosts)?;
    write_file(&cert_path, pair.cert_pem.as_bytes(), false)?;
    write_file(&key_path, pair.key_pem.as_bytes(), true)?;

    info!(
        cert = %cert_path.display(),
        hosts = ?tls.hosts,
        "Generated self-signed certificate"
    );
    Ok(true)
}

fn write_file(path: &Path, contents: &[u8], private: bool) -> Result<(), TlsError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    if private {
        owner_only(&mut options);
    }

    options
        .open(path)
        .and_then(|mut file| file.write_all(contents))
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn owner_only(options: &mut fs::OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut fs::OpenOptions) {}
