//! Ordered multi-certificate PEM bundles.

use crate::fields::{Certificate, CertificateMode};
use crate::input;
use crate::parser::parse_certificate;
use crate::CertscoutError;
use regex::bytes::Regex;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // literal pattern
static CERTIFICATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)-----BEGIN CERTIFICATE-----.+?-----END CERTIFICATE-----")
        .expect("certificate block pattern compiles")
});

/// Certificates in the order their PEM blocks appear in the source text.
///
/// Anything between blocks is ignored. A bundle with no blocks is empty, not
/// an error; a block that fails to decode fails the whole bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateBundle {
    certificates: Vec<Certificate>,
}

impl CertificateBundle {
    pub fn parse(pem: &[u8], mode: CertificateMode) -> Result<Self, CertscoutError> {
        let certificates = CERTIFICATE_BLOCK
            .find_iter(pem)
            .enumerate()
            .map(|(index, block)| {
                parse_certificate(block.as_bytes(), mode).map_err(|err| match err {
                    CertscoutError::CertificateParse(msg) => CertscoutError::CertificateParse(
                        format!("certificate #{} in bundle: {}", index + 1, msg),
                    ),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CertificateBundle { certificates })
    }

    /// Read and parse a bundle file; `what` names the file in path errors.
    pub fn from_file(
        path: &Path,
        mode: CertificateMode,
        what: &'static str,
    ) -> Result<Self, CertscoutError> {
        let data = input::read_file(path, what)?;
        let bundle = Self::parse(&data, mode)?;
        tracing::debug!(
            path = %path.display(),
            count = bundle.len(),
            "loaded certificate bundle"
        );
        Ok(bundle)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn first(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn last(&self) -> Option<&Certificate> {
        self.certificates.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }

    pub fn as_slice(&self) -> &[Certificate] {
        &self.certificates
    }

    /// First certificate satisfying `predicate`, in bundle order.
    pub fn find<P>(&self, mut predicate: P) -> Option<&Certificate>
    where
        P: FnMut(&Certificate) -> bool,
    {
        self.certificates.iter().find(|cert| predicate(cert))
    }
}

impl<'a> IntoIterator for &'a CertificateBundle {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}
