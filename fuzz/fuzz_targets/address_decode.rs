#![no_main]

use didhd_core::{decode_address, encode_address_as, AddressKind, PUBLICKEY_BYTES};
use didhd_spv::Did;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode_address(s);
        let _ = s.parse::<Did>();
    }

    // Any 33 bytes either encode or are rejected as a bad point.
    if let Ok(public_key) = <[u8; PUBLICKEY_BYTES]>::try_from(data) {
        if let Ok(address) = encode_address_as(&public_key, AddressKind::Identity) {
            let (kind, _) = decode_address(&address).expect("encoded address must decode");
            assert_eq!(kind, AddressKind::Identity);
        }
    }
});
