#![no_main]

use certscout_lib::nginx::{strip_comment, ServerBlocks};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    // Include directives would glob the host filesystem.
    if text.contains("include") {
        return;
    }
    for line in text.lines() {
        let _ = strip_comment(line);
    }
    for block in ServerBlocks::from_text(&text, None) {
        let _ = block.tls_bindings();
        let _ = block.ssl_certificate_keys();
    }
});
