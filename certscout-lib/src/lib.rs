//! certscout-lib: TLS certificate discovery and verification for nginx hosts.
//!
//! Finds the certificates referenced by nginx `server` blocks (following
//! `include` directives and glob patterns), checks a single certificate's
//! validity window and self-signed status, and verifies a certificate chain
//! against a trust anchor bundle.

mod bundle;
mod check;
mod discovery;
mod display;
mod fields;
mod fingerprint;
mod input;
pub mod nginx;
mod oid;
mod parser;
mod util;
pub mod verify;

pub use bundle::CertificateBundle;
pub use check::{check_certificate, evaluate_certificate, CheckReport};
pub use discovery::{
    default_conf_dir, discover, discover_file, find_config_files, DiscoveryEntry,
    FREEBSD_CONF_DIR, KUSANAGI_CONF_DIR, LINUX_CONF_DIR,
};
pub use display::to_json;
pub use fields::{
    Certificate, CertificateMode, CertificateStatus, DateTime, ExtendedFields, Identity,
};
pub use fingerprint::sha1_fingerprint;
pub use input::{
    read_file, PathError, CA_CERTIFICATE_FILE, CERTIFICATE_FILE, CONFIGURATION_DIRECTORY,
    CONFIGURATION_FILE, MAX_INPUT_BYTES,
};
pub use parser::parse_certificate;
pub use util::now_timestamp;
pub use verify::{
    find_system_ca_bundle, verify_chain, verify_files, ChainLink, ChainVerification,
    ChainVerifier, VerificationFailure, VerifyReport, VerifyState,
};

/// Version reported in check and verify documents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors returned by certscout-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertscoutError {
    #[error("Certificate is not valid: {0}")]
    CertificateParse(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
