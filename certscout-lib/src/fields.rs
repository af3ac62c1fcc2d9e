//! Certificate data types and the predicates used by checks and chain walks.

use crate::fingerprint;
use crate::verify::{self, VerificationFailure};
use serde::Serialize;

/// How much of a certificate to extract while parsing.
///
/// Each level is a strict superset of the one before it, so callers that only
/// need the common name skip the DN rendering and text extraction work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CertificateMode {
    /// Subject common name only.
    Simple,
    /// Adds subject, issuer and the validity window.
    #[default]
    Default,
    /// Adds version, serial, algorithms, SAN list and SHA-1 fingerprint.
    Extended,
}

/// Verdict reported by the check and verify commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CertificateStatus {
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(rename = "valid")]
    Valid,
    #[serde(rename = "valid-but-self-signed")]
    SelfSigned,
}

impl CertificateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CertificateStatus::Invalid => "invalid",
            CertificateStatus::Valid => "valid",
            CertificateStatus::SelfSigned => "valid-but-self-signed",
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date-time representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTime {
    /// W3C / RFC 3339 formatted string in UTC (e.g. "2026-02-03T23:57:06+00:00").
    pub datetime: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl DateTime {
    pub fn from_timestamp(timestamp: i64) -> Self {
        let datetime = match ::time::OffsetDateTime::from_unix_timestamp(timestamp) {
            Ok(dt) => format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}+00:00",
                dt.year(),
                u8::from(dt.month()),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            ),
            Err(_) => timestamp.to_string(),
        };
        DateTime {
            datetime,
            timestamp,
        }
    }

    /// Format in OpenSSL's default date style: `Feb  3 23:57:06 2026 GMT`.
    pub fn to_openssl(&self) -> String {
        match ::time::OffsetDateTime::from_unix_timestamp(self.timestamp) {
            Ok(dt) => {
                let month = match u8::from(dt.month()) {
                    1 => "Jan",
                    2 => "Feb",
                    3 => "Mar",
                    4 => "Apr",
                    5 => "May",
                    6 => "Jun",
                    7 => "Jul",
                    8 => "Aug",
                    9 => "Sep",
                    10 => "Oct",
                    11 => "Nov",
                    12 => "Dec",
                    _ => "???",
                };
                format!(
                    "{} {:2} {:02}:{:02}:{:02} {} GMT",
                    month,
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    dt.second(),
                    dt.year()
                )
            }
            Err(_) => self.datetime.clone(),
        }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_openssl())
    }
}

/// Fields populated from [`CertificateMode::Default`] upwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Canonical subject DN (`CN=example.com, O=Example`).
    pub subject: String,
    /// Canonical issuer DN, same format as `subject`.
    pub issuer: String,
    pub not_before: DateTime,
    pub not_after: DateTime,
}

/// Fields populated only in [`CertificateMode::Extended`].
///
/// Values are taken from the certificate's rendered text form, so they read
/// exactly as an operator would see them in `openssl x509 -text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedFields {
    pub version: u32,
    pub serial_number: String,
    pub signature_algorithm: String,
    pub subject_alternative_names: String,
    pub public_key_algorithm: String,
    /// Colon-delimited uppercase hex.
    pub sha1_fingerprint: String,
}

/// A parsed X.509 certificate.
///
/// Only obtainable through [`crate::parse_certificate`] or a
/// [`crate::CertificateBundle`], so every value corresponds to a PEM block that
/// decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    #[serde(skip)]
    mode: CertificateMode,
    common_name: String,
    #[serde(flatten)]
    identity: Option<Identity>,
    #[serde(flatten)]
    extended: Option<ExtendedFields>,
    #[serde(skip)]
    raw_der: Vec<u8>,
}

impl Certificate {
    pub(crate) fn new(
        mode: CertificateMode,
        common_name: String,
        identity: Option<Identity>,
        extended: Option<ExtendedFields>,
        raw_der: Vec<u8>,
    ) -> Self {
        Certificate {
            mode,
            common_name,
            identity,
            extended,
            raw_der,
        }
    }

    /// The mode this certificate was parsed with.
    pub fn mode(&self) -> CertificateMode {
        self.mode
    }

    /// Subject CN, or an empty string when the subject has none.
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn extended(&self) -> Option<&ExtendedFields> {
        self.extended.as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.subject.as_str())
    }

    pub fn issuer(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.issuer.as_str())
    }

    pub fn not_before(&self) -> Option<i64> {
        self.identity.as_ref().map(|id| id.not_before.timestamp)
    }

    pub fn not_after(&self) -> Option<i64> {
        self.identity.as_ref().map(|id| id.not_after.timestamp)
    }

    /// DER encoding of the certificate.
    pub fn raw_der(&self) -> &[u8] {
        &self.raw_der
    }

    /// SHA-1 fingerprint over the DER bytes, computed regardless of mode.
    pub fn sha1_fingerprint(&self) -> String {
        match &self.extended {
            Some(ext) => ext.sha1_fingerprint.clone(),
            None => fingerprint::sha1_fingerprint(&self.raw_der),
        }
    }

    /// Whether `now` lies strictly inside the validity window.
    ///
    /// Both boundary instants count as invalid. Always false for certificates
    /// parsed in [`CertificateMode::Simple`].
    pub fn is_valid(&self, now: i64) -> bool {
        match &self.identity {
            Some(id) => id.not_before.timestamp < now && now < id.not_after.timestamp,
            None => false,
        }
    }

    /// Issuer DN string equals subject DN string.
    pub fn is_self_signed(&self) -> bool {
        match &self.identity {
            Some(id) => id.issuer == id.subject,
            None => false,
        }
    }

    /// DN-level signing relation: this certificate's issuer is `candidate`'s
    /// subject. Necessary but not sufficient; see [`Self::verify_signed_with`].
    pub fn is_signed_with(&self, candidate: &Certificate) -> bool {
        match (&self.identity, &candidate.identity) {
            (Some(own), Some(other)) => own.issuer == other.subject,
            _ => false,
        }
    }

    /// Cryptographic signing relation, evaluated at `now`.
    ///
    /// Fails if either certificate is outside its validity window, or if the
    /// signature on this certificate does not verify under `candidate`'s
    /// public key.
    pub fn verify_signed_with(
        &self,
        candidate: &Certificate,
        now: i64,
    ) -> Result<(), VerificationFailure> {
        if self.identity.is_none() || candidate.identity.is_none() {
            return Err(VerificationFailure::MissingValidity);
        }
        if !self.is_valid(now) {
            return Err(VerificationFailure::CertificateExpired);
        }
        if !candidate.is_valid(now) {
            return Err(VerificationFailure::SignerExpired);
        }
        if !verify::signature_verifies(&self.raw_der, &candidate.raw_der) {
            return Err(VerificationFailure::SignatureMismatch);
        }
        Ok(())
    }

    /// Validity verdict at `now`, the way the check command reports it.
    pub fn status(&self, now: i64) -> CertificateStatus {
        if !self.is_valid(now) {
            CertificateStatus::Invalid
        } else if self.is_self_signed() {
            CertificateStatus::SelfSigned
        } else {
            CertificateStatus::Valid
        }
    }
}
