//! OpenSSL-style text rendering and JSON formatting.
//!
//! The text form mirrors the layout of `openssl x509 -noout -text` closely
//! enough that the extended certificate fields can be read back out of it with
//! label-based patterns.

use crate::fields::DateTime;
use crate::oid;
use crate::util;
use crate::CertscoutError;
use serde::Serialize;
use x509_parser::prelude::*;

/// Render a parsed certificate as OpenSSL-like text.
pub(crate) fn render_text(x509: &X509Certificate) -> String {
    let tbs = &x509.tbs_certificate;
    let mut out = String::new();

    out.push_str("Certificate:\n");
    out.push_str("    Data:\n");
    let raw_version = tbs.version.0;
    out.push_str(&format!(
        "        Version: {} (0x{:x})\n",
        raw_version.saturating_add(1),
        raw_version
    ));
    out.push_str("        Serial Number:\n");
    out.push_str(&format!(
        "            {}\n",
        util::hex_colon_lower(tbs.raw_serial())
    ));
    let signature_algorithm = signature_algorithm_name(&x509.signature_algorithm);
    out.push_str(&format!(
        "        Signature Algorithm: {}\n",
        signature_algorithm
    ));
    out.push_str(&format!("        Issuer: {}\n", oneline_dn(&tbs.issuer)));
    out.push_str("        Validity\n");
    out.push_str(&format!(
        "            Not Before: {}\n",
        DateTime::from_timestamp(tbs.validity.not_before.timestamp())
    ));
    out.push_str(&format!(
        "            Not After : {}\n",
        DateTime::from_timestamp(tbs.validity.not_after.timestamp())
    ));
    out.push_str(&format!("        Subject: {}\n", oneline_dn(&tbs.subject)));
    out.push_str("        Subject Public Key Info:\n");
    out.push_str(&format!(
        "            Public Key Algorithm: {}\n",
        public_key_algorithm_name(&tbs.subject_pki)
    ));

    let san = subject_alternative_names(x509);
    if !san.is_empty() {
        out.push_str("        X509v3 extensions:\n");
        out.push_str("            X509v3 Subject Alternative Name: \n");
        out.push_str(&format!("                {}\n", san.join(", ")));
    }

    out.push_str(&format!("    Signature Algorithm: {}\n", signature_algorithm));
    out
}

fn signature_algorithm_name(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::RSASSA_PSS => "rsassaPss".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "ED25519".into(),
        oid::ED448 => "ED448".into(),
        other => other.to_string(),
    }
}

fn public_key_algorithm_name(spki: &SubjectPublicKeyInfo) -> String {
    match spki.algorithm.algorithm.to_id_string().as_str() {
        oid::RSA_ENCRYPTION => "rsaEncryption".into(),
        oid::EC_PUBLIC_KEY => "id-ecPublicKey".into(),
        oid::ED25519 => "ED25519".into(),
        oid::ED448 => "ED448".into(),
        other => other.to_string(),
    }
}

/// `C = US, O = Example, CN = example.com`, escaping separators in values.
fn oneline_dn(name: &X509Name) -> String {
    let mut parts = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = util::attribute_value(attr);
            parts.push(format!("{} = {}", key, escape_dn_value(&value)));
        }
    }
    parts.join(", ")
}

fn escape_dn_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, ',' | '+' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn subject_alternative_names(x509: &X509Certificate) -> Vec<String> {
    match x509.subject_alternative_name() {
        Ok(Some(ext)) => ext
            .value
            .general_names
            .iter()
            .map(format_general_name)
            .collect(),
        _ => Vec::new(),
    }
}

fn format_general_name(gn: &GeneralName) -> String {
    match gn {
        GeneralName::DNSName(name) => format!("DNS:{}", name),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::IPAddress(ip_bytes) => format!("IP Address:{}", format_ip_bytes(ip_bytes)),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::DirectoryName(dn) => format!("DirName:{}", oneline_dn(dn)),
        _ => "othername:<unsupported>".into(),
    }
}

fn format_ip_bytes(bytes: &[u8]) -> String {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        std::net::Ipv4Addr::from(octets).to_string()
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        std::net::Ipv6Addr::from(octets).to_string().to_uppercase()
    } else {
        util::hex_colon_upper(bytes)
    }
}

/// Serialize a report to JSON, pretty-printed when `pretty` is set.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CertscoutError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
