#![no_main]

use didhd_core::{DerivationPath, ExtendedPrivateKey, ExtendedPublicKey};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xpub) = ExtendedPublicKey::deserialize(data) {
        // Anything accepted re-serializes to the same bytes
        assert_eq!(&xpub.serialize()[..], data);
        let _ = xpub.derive_public(0, 0);
    }
    if let Ok(xprv) = ExtendedPrivateKey::deserialize(data) {
        assert_eq!(&xprv.serialize()[..], data);
        let _ = xprv.derive_path(&DerivationPath::new(vec![0, 0x8000_0000]));
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = ExtendedPublicKey::from_base58(s);
        let _ = ExtendedPrivateKey::from_base58(s);
        if let Ok(path) = s.parse::<DerivationPath>() {
            // Display output parses back to the same path
            assert_eq!(path.to_string().parse::<DerivationPath>().ok(), Some(path));
        }
    }
});
