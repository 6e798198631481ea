#![no_main]

use didhd_core::{detect_language, seed_from_mnemonic, Language};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text against every wordlist: Ok or Err, never a panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = detect_language(s);
        for language in Language::ALL {
            let _ = seed_from_mnemonic(s, "", language);
        }
    }
});
