//! Shared encoding and naming utilities.

use crate::oid;
use std::time::{SystemTime, UNIX_EPOCH};
use x509_parser::x509::AttributeTypeAndValue;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Format bytes as colon-separated lowercase hex, the way OpenSSL prints
/// serial numbers (e.g., "0a:1b:2c").
pub fn hex_colon_lower(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Map a DN attribute OID to the short name OpenSSL uses as its key.
///
/// Unknown attributes keep their dotted-decimal OID.
pub fn oid_short_name(oid_str: &str) -> String {
    match oid_str {
        oid::COMMON_NAME => "CN",
        oid::SURNAME => "SN",
        oid::SERIAL_NUMBER => "serialNumber",
        oid::COUNTRY => "C",
        oid::LOCALITY => "L",
        oid::STATE_OR_PROVINCE => "ST",
        oid::STREET_ADDRESS => "street",
        oid::ORGANIZATION => "O",
        oid::ORGANIZATIONAL_UNIT => "OU",
        oid::TITLE => "title",
        oid::POSTAL_CODE => "postalCode",
        oid::GIVEN_NAME => "GN",
        oid::EMAIL_ADDRESS => "emailAddress",
        oid::DOMAIN_COMPONENT => "DC",
        other => other,
    }
    .to_string()
}

/// Text of a DN attribute value.
///
/// Values that are not a plain string type (BMPString, UniversalString, ...)
/// are written byte by byte as `\xHH`, so distinct values never collapse
/// into one placeholder.
pub fn attribute_value(attr: &AttributeTypeAndValue) -> String {
    match attr.as_str() {
        Ok(value) => value.to_string(),
        Err(_) => escape_bytes(attr.as_slice()),
    }
}

/// `\xHH` for every byte, as OpenSSL escapes undecodable name bytes.
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("\\x{:02X}", b)).collect()
}

/// Current time as seconds since the Unix epoch.
pub fn now_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
