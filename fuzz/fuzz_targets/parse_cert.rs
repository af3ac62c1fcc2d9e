#![no_main]

use certscout_lib::{parse_certificate, CertificateBundle, CertificateMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser must never panic, regardless of input.
    if let Ok(cert) = parse_certificate(data, CertificateMode::Extended) {
        // If parsing succeeds, exercise the predicates and serialization
        let _ = cert.is_valid(0);
        let _ = cert.is_self_signed();
        let _ = cert.is_signed_with(&cert);
        let _ = cert.verify_signed_with(&cert, 0);
        let _ = cert.sha1_fingerprint();
        let _ = certscout_lib::to_json(&cert, false);
    }

    if let Ok(bundle) = CertificateBundle::parse(data, CertificateMode::Default) {
        let _ = certscout_lib::verify_chain(&bundle, &bundle);
    }
});
