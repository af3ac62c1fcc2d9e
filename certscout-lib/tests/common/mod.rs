//! Certificate fixtures minted with rcgen for the integration tests.
#![allow(dead_code, clippy::expect_used, clippy::indexing_slicing)]

use base64::Engine;
use certscout_lib::{CertificateBundle, CertificateMode};
use rcgen::{
    BasicConstraints, BmpString, CertificateParams, DistinguishedName, DnType, DnValue, IsCa,
    KeyPair,
};

/// 2025-06-15, inside every default validity window below.
pub const NOW: i64 = 1_750_000_000;

/// A minted certificate together with the key that can sign for it.
pub struct Issued {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

impl Issued {
    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    /// Private key block followed by the certificate, as in a combined file.
    pub fn key_then_certificate_pem(&self) -> String {
        format!("{}{}", self.key.serialize_pem(), self.cert.pem())
    }
}

fn params(cn: &str, ca: bool, validity: (i32, i32)) -> CertificateParams {
    let sans = if ca { Vec::new() } else { vec![cn.to_string()] };
    let mut params = CertificateParams::new(sans).expect("valid SAN list");
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn.push(DnType::OrganizationName, "Example Org");
    params.distinguished_name = dn;
    params.not_before = rcgen::date_time_ymd(validity.0, 1, 1);
    params.not_after = rcgen::date_time_ymd(validity.1, 1, 1);
    if ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    }
    params
}

pub fn root(cn: &str) -> Issued {
    let key = KeyPair::generate().expect("key generation");
    let cert = params(cn, true, (2020, 2040)).self_signed(&key).expect("self-signed root");
    Issued { cert, key }
}

pub fn intermediate(cn: &str, parent: &Issued) -> Issued {
    intermediate_with_validity(cn, parent, (2020, 2040))
}

pub fn intermediate_with_validity(cn: &str, parent: &Issued, validity: (i32, i32)) -> Issued {
    let key = KeyPair::generate().expect("key generation");
    let cert = params(cn, true, validity)
        .signed_by(&key, &parent.cert, &parent.key)
        .expect("signed intermediate");
    Issued { cert, key }
}

pub fn leaf(cn: &str, parent: &Issued) -> Issued {
    leaf_with_validity(cn, parent, (2020, 2040))
}

pub fn leaf_with_validity(cn: &str, parent: &Issued, validity: (i32, i32)) -> Issued {
    let key = KeyPair::generate().expect("key generation");
    let cert = params(cn, false, validity)
        .signed_by(&key, &parent.cert, &parent.key)
        .expect("signed leaf");
    Issued { cert, key }
}

pub fn self_signed_leaf(cn: &str, validity: (i32, i32)) -> Issued {
    let key = KeyPair::generate().expect("key generation");
    let cert = params(cn, false, validity).self_signed(&key).expect("self-signed leaf");
    Issued { cert, key }
}

/// Concatenated PEM, with some noise between blocks.
pub fn pem_bundle(certs: &[&Issued]) -> String {
    certs
        .iter()
        .map(|c| c.pem())
        .collect::<Vec<_>>()
        .join("# next certificate\n")
}

pub fn bundle(certs: &[&Issued]) -> CertificateBundle {
    CertificateBundle::parse(pem_bundle(certs).as_bytes(), CertificateMode::Default)
        .expect("fixture bundle parses")
}

/// Self-signed certificate whose only subject attribute is a BMPString CN.
pub fn bmp_named(parent: Option<&Issued>, cn: &str) -> Issued {
    let key = KeyPair::generate().expect("key generation");
    let mut params = CertificateParams::new(Vec::new()).expect("empty SAN list");
    let mut dn = DistinguishedName::new();
    dn.push(
        DnType::CommonName,
        DnValue::BmpString(BmpString::try_from(cn).expect("BMP-encodable name")),
    );
    params.distinguished_name = dn;
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(2040, 1, 1);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let cert = match parent {
        Some(parent) => params.signed_by(&key, &parent.cert, &parent.key),
        None => params.self_signed(&key),
    }
    .expect("BMP-named certificate");
    Issued { cert, key }
}

// ---------------------------------------------------------------------------
// Hand-edited DER
// ---------------------------------------------------------------------------

/// Header length and announced content length of the DER element at `der`.
fn der_header(der: &[u8]) -> (usize, usize) {
    let first = der[1];
    if first < 0x80 {
        return (2, usize::from(first));
    }
    let count = usize::from(first & 0x7f);
    let len = der[2..2 + count]
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    (2 + count, len)
}

fn der_sequence(body: &[u8]) -> Vec<u8> {
    let len = body.len();
    let mut out = vec![0x30];
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(body);
    out
}

/// `issued` re-encoded with its version INTEGER content replaced by
/// `version` (big-endian octets). The signature no longer matches.
pub fn with_raw_version(issued: &Issued, version: &[u8]) -> String {
    const V3: [u8; 5] = [0xA0, 0x03, 0x02, 0x01, 0x02];
    let der: &[u8] = issued.cert.der();
    let (outer_header, _) = der_header(der);
    let outer = &der[outer_header..];
    let (tbs_header, tbs_len) = der_header(outer);
    let tbs = &outer[tbs_header..tbs_header + tbs_len];
    let signature = &outer[tbs_header + tbs_len..];
    assert!(tbs.starts_with(&V3), "explicit v3 version field");

    let mut tbs_body = vec![0xA0, version.len() as u8 + 2, 0x02, version.len() as u8];
    tbs_body.extend_from_slice(version);
    tbs_body.extend_from_slice(&tbs[V3.len()..]);
    let mut cert_body = der_sequence(&tbs_body);
    cert_body.extend_from_slice(signature);
    pem_block("CERTIFICATE", &der_sequence(&cert_body))
}

pub fn pem_block(label: &str, der: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {}-----\n", label);
    for chunk in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", label));
    pem
}
