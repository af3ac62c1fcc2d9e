//! Trust anchor bundle discovery.
//!
//! Follows OpenSSL's lookup order for the default CA bundle so that
//! verification without an explicit anchor file trusts the same roots the
//! platform's TLS stack does.

use super::VerificationFailure;
use crate::bundle::CertificateBundle;
use crate::fields::CertificateMode;
use crate::input::{PathError, CA_CERTIFICATE_FILE};
use std::path::{Path, PathBuf};

/// Well-known CA bundle file paths, in order of preference.
pub const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
        tracing::debug!(path = %p.display(), "SSL_CERT_FILE does not exist, ignoring");
    }

    let probe = openssl_probe::probe();
    if let Some(file) = probe.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// The anchor file to use: the explicit one when given, else the system
/// bundle.
pub fn anchor_bundle_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if !path.as_os_str().is_empty() => Some(path.to_path_buf()),
        _ => find_system_ca_bundle(),
    }
}

/// Load the anchor bundle, mapping every load problem to a verification
/// failure the report can carry.
pub fn load_anchor_bundle(
    explicit: Option<&Path>,
) -> Result<CertificateBundle, VerificationFailure> {
    let path = anchor_bundle_path(explicit).ok_or_else(|| {
        VerificationFailure::Load(PathError::NotSpecified(CA_CERTIFICATE_FILE).to_string())
    })?;
    tracing::debug!(path = %path.display(), "loading trust anchors");
    CertificateBundle::from_file(&path, CertificateMode::Default, CA_CERTIFICATE_FILE)
        .map_err(|e| VerificationFailure::Load(e.to_string()))
}
