//! Small helpers shared by the chain walk.

use crate::fields::Certificate;
use x509_parser::prelude::*;

/// Whether `subject_der`'s signature verifies under `signer_der`'s public key.
///
/// Either certificate failing to decode counts as a failed verification.
pub(crate) fn signature_verifies(subject_der: &[u8], signer_der: &[u8]) -> bool {
    let Ok((_, subject)) = X509Certificate::from_der(subject_der) else {
        return false;
    };
    let Ok((_, signer)) = X509Certificate::from_der(signer_der) else {
        return false;
    };
    match subject.verify_signature(Some(signer.public_key())) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "signature check failed");
            false
        }
    }
}

/// Short label for log lines: the CN, else the subject DN, else "Unknown".
pub(crate) fn short_name(cert: &Certificate) -> String {
    if !cert.common_name().is_empty() {
        return cert.common_name().to_string();
    }
    match cert.subject() {
        Some(subject) if !subject.is_empty() => subject.to_string(),
        _ => "Unknown".into(),
    }
}
