//! Certificate chain verification against a trust anchor bundle.
//!
//! The subject bundle is walked pairwise (each certificate must be issued by
//! the next one, by DN and by signature), then the last certificate is matched
//! against the anchors. The first anchor whose subject DN matches decides the
//! outcome: a cryptographic failure against it rejects the chain without
//! trying later anchors.
//!
//! The default anchor location is discovered via `openssl-probe` and
//! environment variables, matching OpenSSL's lookup behavior.

mod helpers;
mod report;
mod trust_store;

use crate::bundle::CertificateBundle;
use crate::fields::{Certificate, CertificateStatus};
use crate::input::{CA_CERTIFICATE_FILE, CERTIFICATE_FILE};
use crate::util;
use serde::Serialize;
use std::borrow::Cow;

pub(crate) use helpers::signature_verifies;
use helpers::short_name;
pub use report::{verify_files, VerifyReport};
pub use trust_store::{
    anchor_bundle_path, find_system_ca_bundle, load_anchor_bundle, KNOWN_CA_BUNDLE_PATHS,
};

/// Why a chain was rejected. The display text is the report message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("Certificate is expired")]
    CertificateExpired,

    #[error("Signed certificate is expired")]
    SignerExpired,

    #[error("Certificate is not signed by public key of signed certificate")]
    SignatureMismatch,

    #[error("Certificate is not signed by signed certificate")]
    IssuerMismatch,

    #[error("Certificate was parsed without subject, issuer and validity")]
    MissingValidity,

    #[error("{0} contains no certificates")]
    EmptyBundle(&'static str),

    #[error("Signed certificate is not found")]
    AnchorNotFound,

    #[error("{0}")]
    Load(String),
}

/// Progress of one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    /// Walking consecutive pairs of the subject bundle.
    Building,
    /// Subject chain is consistent; looking for a trust anchor.
    SearchingAnchor,
    Valid,
    SelfSigned,
    Invalid,
}

impl VerifyState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VerifyState::Valid | VerifyState::SelfSigned | VerifyState::Invalid
        )
    }

    /// Reported status; non-terminal states report as invalid.
    pub fn status(self) -> CertificateStatus {
        match self {
            VerifyState::Valid => CertificateStatus::Valid,
            VerifyState::SelfSigned => CertificateStatus::SelfSigned,
            _ => CertificateStatus::Invalid,
        }
    }
}

/// One certificate of the subject bundle and what was found to sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    pub certificate: Certificate,
    /// Candidate signer: the next certificate in the bundle, or the trust
    /// anchor for the last one. Set before the relation is checked, so a
    /// failed link still shows what it was checked against.
    pub signed_by: Option<Certificate>,
    pub verified: bool,
}

impl ChainLink {
    fn new(certificate: Certificate) -> Self {
        ChainLink {
            certificate,
            signed_by: None,
            verified: false,
        }
    }
}

/// Outcome of a verification run with the evidence gathered up to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub state: VerifyState,
    pub failure: Option<VerificationFailure>,
    pub chain: Vec<ChainLink>,
}

impl ChainVerification {
    fn invalid(failure: VerificationFailure, chain: Vec<ChainLink>) -> Self {
        ChainVerification {
            state: VerifyState::Invalid,
            failure: Some(failure),
            chain,
        }
    }

    /// A run that never started because its subject bundle could not be loaded.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::invalid(VerificationFailure::Load(message.into()), Vec::new())
    }

    pub fn status(&self) -> CertificateStatus {
        self.state.status()
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self.state, VerifyState::Valid | VerifyState::SelfSigned)
    }

    /// Failure message, or empty when the chain verified.
    pub fn message(&self) -> String {
        self.failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for ChainVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [OK/FAIL], [optional reason]
        if let Some(first) = self.chain.first() {
            write!(f, "{}, ", short_name(&first.certificate))?;
        }
        if self.is_trusted() {
            write!(f, "OK")
        } else {
            write!(f, "FAIL, {}", self.message())
        }
    }
}

/// Walks a subject bundle to a trust anchor at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainVerifier {
    now: i64,
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainVerifier {
    /// Verifier evaluating validity windows at the current time.
    pub fn new() -> Self {
        ChainVerifier {
            now: util::now_timestamp(),
        }
    }

    /// Verifier evaluating validity windows at `now` (Unix seconds).
    pub fn at(now: i64) -> Self {
        ChainVerifier { now }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    /// Verify `subject` against an already-loaded anchor bundle.
    pub fn verify(
        &self,
        subject: &CertificateBundle,
        anchors: &CertificateBundle,
    ) -> ChainVerification {
        self.verify_with(subject, || Ok(Cow::Borrowed(anchors)))
    }

    /// Verify `subject`, loading the anchors only once the subject chain has
    /// been found internally consistent.
    pub fn verify_with<'a, F>(
        &self,
        subject: &CertificateBundle,
        load_anchors: F,
    ) -> ChainVerification
    where
        F: FnOnce() -> Result<Cow<'a, CertificateBundle>, VerificationFailure>,
    {
        let mut run = Run::new(subject.len());

        let Some(first) = subject.first() else {
            return run.reject(VerificationFailure::EmptyBundle(CERTIFICATE_FILE));
        };
        run.chain.push(ChainLink::new(first.clone()));

        for pair in subject.as_slice().windows(2) {
            let [cert, signer] = pair else {
                continue;
            };
            run.set_signer(signer);
            if !cert.is_signed_with(signer) {
                return run.reject(VerificationFailure::IssuerMismatch);
            }
            if let Err(failure) = cert.verify_signed_with(signer, self.now) {
                return run.reject(failure);
            }
            run.mark_verified();
            tracing::debug!(
                certificate = %short_name(cert),
                signer = %short_name(signer),
                "link verified"
            );
            run.chain.push(ChainLink::new(signer.clone()));
        }

        let Some(top) = subject.last() else {
            return run.reject(VerificationFailure::EmptyBundle(CERTIFICATE_FILE));
        };
        run.enter(VerifyState::SearchingAnchor);

        let anchors = match load_anchors() {
            Ok(anchors) => anchors,
            Err(failure) => return run.reject(failure),
        };
        if anchors.is_empty() {
            return run.reject(VerificationFailure::EmptyBundle(CA_CERTIFICATE_FILE));
        }

        let Some(anchor) = anchors.find(|candidate| top.is_signed_with(candidate)) else {
            return run.reject(VerificationFailure::AnchorNotFound);
        };
        run.set_signer(anchor);
        if let Err(failure) = top.verify_signed_with(anchor, self.now) {
            return run.reject(failure);
        }
        run.mark_verified();
        tracing::debug!(anchor = %short_name(anchor), "chain anchored");

        if top.is_self_signed() {
            run.finish(VerifyState::SelfSigned)
        } else {
            run.finish(VerifyState::Valid)
        }
    }
}

/// State and evidence of a verification in progress.
struct Run {
    state: VerifyState,
    chain: Vec<ChainLink>,
}

impl Run {
    fn new(certificates: usize) -> Self {
        tracing::debug!(certificates, "building chain");
        Run {
            state: VerifyState::Building,
            chain: Vec::with_capacity(certificates),
        }
    }

    fn enter(&mut self, next: VerifyState) {
        debug_assert!(!self.state.is_terminal(), "left terminal state {:?}", self.state);
        tracing::debug!(from = ?self.state, to = ?next, "verification state");
        self.state = next;
    }

    /// Record the candidate signer of the newest link before it is checked.
    fn set_signer(&mut self, signer: &Certificate) {
        if let Some(link) = self.chain.last_mut() {
            link.signed_by = Some(signer.clone());
        }
    }

    fn mark_verified(&mut self) {
        if let Some(link) = self.chain.last_mut() {
            link.verified = true;
        }
    }

    fn reject(mut self, failure: VerificationFailure) -> ChainVerification {
        tracing::debug!(
            during = ?self.state,
            reason = %failure,
            links = self.chain.len(),
            "chain rejected"
        );
        self.enter(VerifyState::Invalid);
        ChainVerification::invalid(failure, self.chain)
    }

    fn finish(mut self, state: VerifyState) -> ChainVerification {
        self.enter(state);
        ChainVerification {
            state: self.state,
            failure: None,
            chain: self.chain,
        }
    }
}

/// Verify `subject` against `anchors` at the current time.
pub fn verify_chain(subject: &CertificateBundle, anchors: &CertificateBundle) -> ChainVerification {
    ChainVerifier::new().verify(subject, anchors)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::CertificateMode;

    #[test]
    fn terminal_states() {
        assert!(!VerifyState::Building.is_terminal());
        assert!(!VerifyState::SearchingAnchor.is_terminal());
        assert!(VerifyState::Valid.is_terminal());
        assert!(VerifyState::SelfSigned.is_terminal());
        assert!(VerifyState::Invalid.is_terminal());
        assert_eq!(VerifyState::SearchingAnchor.status(), CertificateStatus::Invalid);
    }

    #[test]
    fn run_walks_building_then_searching_anchor() {
        let mut run = Run::new(2);
        assert_eq!(run.state, VerifyState::Building);
        run.enter(VerifyState::SearchingAnchor);
        assert_eq!(run.state, VerifyState::SearchingAnchor);
        let result = run.finish(VerifyState::SelfSigned);
        assert_eq!(result.state, VerifyState::SelfSigned);
        assert!(result.failure.is_none());
        assert!(result.is_trusted());
    }

    #[test]
    fn rejection_ends_in_invalid_from_any_open_state() {
        let result = Run::new(1).reject(VerificationFailure::IssuerMismatch);
        assert_eq!(result.state, VerifyState::Invalid);
        assert!(result.state.is_terminal());

        let mut run = Run::new(1);
        run.enter(VerifyState::SearchingAnchor);
        let result = run.reject(VerificationFailure::AnchorNotFound);
        assert_eq!(result.state, VerifyState::Invalid);
        assert_eq!(result.failure, Some(VerificationFailure::AnchorNotFound));
    }

    #[test]
    fn empty_subject_is_invalid() {
        let empty = CertificateBundle::parse(b"", CertificateMode::Default).unwrap();
        let result = ChainVerifier::at(0).verify(&empty, &empty);
        assert_eq!(result.state, VerifyState::Invalid);
        assert_eq!(result.message(), "Certificate file contains no certificates");
        assert!(result.chain.is_empty());
    }

    #[test]
    fn failure_messages() {
        assert_eq!(
            VerificationFailure::AnchorNotFound.to_string(),
            "Signed certificate is not found"
        );
        assert_eq!(
            VerificationFailure::IssuerMismatch.to_string(),
            "Certificate is not signed by signed certificate"
        );
        assert_eq!(
            ChainVerification::load_failed("Certificate file does not exist").to_string(),
            "FAIL, Certificate file does not exist"
        );
    }
}
