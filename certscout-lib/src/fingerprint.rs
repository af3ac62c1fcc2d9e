//! Certificate fingerprint (digest) computation.

use crate::util;
use digest::Digest;

/// SHA-1 fingerprint of DER-encoded certificate bytes.
///
/// Returns a colon-separated uppercase hex string (e.g., "AB:CD:EF:...").
pub fn sha1_fingerprint(der_bytes: &[u8]) -> String {
    util::hex_colon_upper(&sha1::Sha1::digest(der_bytes))
}
