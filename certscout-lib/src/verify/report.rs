use super::{load_anchor_bundle, ChainLink, ChainVerification, ChainVerifier};
use crate::bundle::CertificateBundle;
use crate::fields::{CertificateMode, CertificateStatus};
use crate::input::CERTIFICATE_FILE;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// JSON document produced by the verify command.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub version: &'static str,
    pub status: CertificateStatus,
    pub message: String,
    pub chain: Vec<ChainLink>,
    #[serde(skip)]
    input_failed: bool,
}

impl VerifyReport {
    fn new(verification: ChainVerification, input_failed: bool) -> Self {
        VerifyReport {
            version: crate::VERSION,
            status: verification.status(),
            message: verification.message(),
            chain: verification.chain,
            input_failed,
        }
    }

    /// The chain file could not be loaded or held no certificates.
    pub fn input_failed(&self) -> bool {
        self.input_failed
    }
}

/// Verify the chain in `chain_path` against `ca_path`, or against the system
/// bundle when no anchor file is given, at `now`.
///
/// A chain file that cannot be loaded or holds no certificate block marks the
/// report as an input failure.
pub fn verify_files(chain_path: &Path, ca_path: Option<&Path>, now: i64) -> VerifyReport {
    let loaded =
        CertificateBundle::from_file(chain_path, CertificateMode::Default, CERTIFICATE_FILE);
    let subject = match loaded {
        Ok(bundle) => bundle,
        Err(err) => {
            tracing::warn!(
                path = %chain_path.display(),
                error = %err,
                "cannot load certificate chain"
            );
            return VerifyReport::new(ChainVerification::load_failed(err.to_string()), true);
        }
    };
    if subject.is_empty() {
        tracing::warn!(path = %chain_path.display(), "certificate chain file has no certificates");
    }

    let verification = ChainVerifier::at(now)
        .verify_with(&subject, || load_anchor_bundle(ca_path).map(Cow::Owned));
    tracing::debug!(result = %verification, "verification finished");
    VerifyReport::new(verification, subject.is_empty())
}
