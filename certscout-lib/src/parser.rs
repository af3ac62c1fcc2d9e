//! Certificate parsing from PEM.

use crate::display;
use crate::fields::{Certificate, CertificateMode, DateTime, ExtendedFields, Identity};
use crate::fingerprint;
use crate::oid;
use crate::util;
use crate::CertscoutError;
use regex::Regex;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

/// Parse the first PEM certificate block in `input`, extracting the fields
/// `mode` asks for.
///
/// Blocks with other labels (a private key stored ahead of the certificate,
/// for instance) are skipped. Fails with [`CertscoutError::CertificateParse`]
/// when the input holds no decodable certificate. No partially populated
/// [`Certificate`] is ever returned.
pub fn parse_certificate(
    input: &[u8],
    mode: CertificateMode,
) -> Result<Certificate, CertscoutError> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(CertscoutError::CertificateParse("empty input".into()));
    }

    let pem = first_certificate_block(input)?;

    let (remaining, x509) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| CertscoutError::CertificateParse(format!("invalid DER: {}", e)))?;

    let raw_version = x509.tbs_certificate.version.0;
    if raw_version > 2 {
        return Err(CertscoutError::CertificateParse(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            u64::from(raw_version) + 1
        )));
    }

    // Trailing bytes after the certificate must not leak into the fingerprint.
    let cert_len = pem.contents.len() - remaining.len();
    let raw_der = pem.contents.get(..cert_len).unwrap_or(&pem.contents);

    Ok(build_certificate(&x509, raw_der, mode))
}

fn is_certificate_label(label: &str) -> bool {
    matches!(label, "CERTIFICATE" | "TRUSTED CERTIFICATE" | "X509 CERTIFICATE")
}

/// First block with a certificate label. When there is none, the error names
/// the first block that was passed over.
fn first_certificate_block(input: &[u8]) -> Result<Pem, CertscoutError> {
    let mut passed_over: Option<String> = None;
    for block in Pem::iter_from_buffer(input) {
        match block {
            Ok(pem) if is_certificate_label(&pem.label) => return Ok(pem),
            Ok(pem) => {
                tracing::trace!(label = %pem.label, "skipping PEM block");
                passed_over
                    .get_or_insert_with(|| format!("expected CERTIFICATE, got {}", pem.label));
            }
            Err(err) => {
                tracing::trace!(error = %err, "skipping undecodable PEM block");
                passed_over.get_or_insert_with(|| format!("invalid PEM: {}", err));
            }
        }
    }
    Err(CertscoutError::CertificateParse(
        passed_over.unwrap_or_else(|| "no PEM block found".into()),
    ))
}

fn build_certificate(
    x509: &X509Certificate,
    raw_der: &[u8],
    mode: CertificateMode,
) -> Certificate {
    let tbs = &x509.tbs_certificate;
    let common_name = first_common_name(&tbs.subject);

    let identity = (mode >= CertificateMode::Default).then(|| Identity {
        subject: canonical_dn(&tbs.subject),
        issuer: canonical_dn(&tbs.issuer),
        not_before: DateTime::from_timestamp(tbs.validity.not_before.timestamp()),
        not_after: DateTime::from_timestamp(tbs.validity.not_after.timestamp()),
    });

    let extended = (mode >= CertificateMode::Extended).then(|| {
        let text = display::render_text(x509);
        ExtendedFields {
            version: leading_version(&field_in_line("Version", &text)),
            serial_number: field_next_line("Serial Number", &text),
            signature_algorithm: field_in_line("Signature Algorithm", &text),
            subject_alternative_names: field_next_line("X509v3 Subject Alternative Name", &text),
            public_key_algorithm: field_in_line("Public Key Algorithm", &text),
            sha1_fingerprint: fingerprint::sha1_fingerprint(raw_der),
        }
    });

    Certificate::new(mode, common_name, identity, extended, raw_der.to_vec())
}

fn first_common_name(name: &X509Name) -> String {
    name.iter_attributes()
        .find(|attr| attr.attr_type().to_id_string() == oid::COMMON_NAME)
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Canonical DN string: `key=value` pairs joined by `", "` in first-seen key
/// order. Values of a repeated key are joined by `"\n"` under one key.
pub(crate) fn canonical_dn(name: &X509Name) -> String {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = util::attribute_value(attr);
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value),
                None => entries.push((key, vec![value])),
            }
        }
    }
    entries
        .iter()
        .map(|(key, values)| format!("{}={}", key, values.join("\n")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Value following `LABEL: ` on the same line, or empty.
pub(crate) fn field_in_line(label: &str, text: &str) -> String {
    capture_field(&format!(r"(?m)^\s*{}: (.+)$", regex::escape(label)), text)
}

/// Value following `LABEL:` and any whitespace, including line breaks, or empty.
pub(crate) fn field_next_line(label: &str, text: &str) -> String {
    capture_field(&format!(r"(?m)^\s*{}:\s+(.+)$", regex::escape(label)), text)
}

fn capture_field(pattern: &str, text: &str) -> String {
    let Ok(re) = Regex::new(pattern) else {
        return String::new();
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
        .unwrap_or_default()
}

/// Leading decimal digits of a `Version` value ("3 (0x2)" gives 3), else 0.
pub(crate) fn leading_version(value: &str) -> u32 {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Certificate:
    Data:
        Version: 3 (0x2)
        Serial Number:
            0a:1b
        Signature Algorithm: sha256WithRSAEncryption
        Subject Public Key Info:
            Public Key Algorithm: rsaEncryption
        X509v3 extensions:
            X509v3 Subject Alternative Name:
                DNS:a.example, DNS:b.example
    Signature Algorithm: sha256WithRSAEncryption
";

    #[test]
    fn in_line_fields() {
        assert_eq!(field_in_line("Version", TEXT), "3 (0x2)");
        assert_eq!(field_in_line("Signature Algorithm", TEXT), "sha256WithRSAEncryption");
        assert_eq!(field_in_line("Public Key Algorithm", TEXT), "rsaEncryption");
        assert_eq!(field_in_line("Missing Label", TEXT), "");
    }

    #[test]
    fn next_line_fields() {
        assert_eq!(field_next_line("Serial Number", TEXT), "0a:1b");
        assert_eq!(
            field_next_line("X509v3 Subject Alternative Name", TEXT),
            "DNS:a.example, DNS:b.example"
        );
    }

    #[test]
    fn version_takes_leading_digits() {
        assert_eq!(leading_version("3 (0x2)"), 3);
        assert_eq!(leading_version("12abc"), 12);
        assert_eq!(leading_version("v3"), 0);
        assert_eq!(leading_version(""), 0);
    }

    #[test]
    fn whitespace_only_input_is_rejected() {
        assert!(matches!(
            parse_certificate(b"  \n", CertificateMode::Simple),
            Err(CertscoutError::CertificateParse(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_certificate(b"not a certificate", CertificateMode::Default).is_err());
        let bad = b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(parse_certificate(bad, CertificateMode::Default).is_err());
    }
}
