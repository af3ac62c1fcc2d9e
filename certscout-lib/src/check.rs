//! Single-certificate validity check.

use crate::fields::{Certificate, CertificateMode, CertificateStatus};
use crate::input::{self, CERTIFICATE_FILE};
use crate::parser::parse_certificate;
use crate::CertscoutError;
use serde::Serialize;
use std::path::Path;

/// JSON document produced by the check command.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub version: &'static str,
    pub status: CertificateStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    #[serde(skip)]
    input_failed: bool,
}

impl CheckReport {
    /// The certificate file could not be loaded or parsed.
    pub fn input_failed(&self) -> bool {
        self.input_failed
    }

    fn failed(err: &CertscoutError) -> Self {
        CheckReport {
            version: crate::VERSION,
            status: CertificateStatus::Invalid,
            message: err.to_string(),
            certificate: None,
            input_failed: true,
        }
    }
}

/// Evaluate an already-parsed certificate at `now`.
pub fn evaluate_certificate(certificate: Certificate, now: i64) -> CheckReport {
    let status = certificate.status(now);
    let message = match status {
        CertificateStatus::Invalid => match certificate.not_before() {
            Some(not_before) if now <= not_before => "Certificate is not yet valid",
            _ => "Certificate is expired",
        },
        CertificateStatus::Valid | CertificateStatus::SelfSigned => "",
    };
    CheckReport {
        version: crate::VERSION,
        status,
        message: message.to_string(),
        certificate: Some(certificate),
        input_failed: false,
    }
}

/// Read, parse (extended mode) and evaluate the certificate at `path`.
pub fn check_certificate(path: &Path, now: i64) -> CheckReport {
    let loaded = input::read_file(path, CERTIFICATE_FILE)
        .map_err(CertscoutError::from)
        .and_then(|data| parse_certificate(&data, CertificateMode::Extended));
    match loaded {
        Ok(certificate) => {
            tracing::debug!(
                path = %path.display(),
                cn = certificate.common_name(),
                "checking certificate"
            );
            evaluate_certificate(certificate, now)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cannot load certificate");
            CheckReport::failed(&err)
        }
    }
}
