//! End-to-end identity lifecycle:
//! mnemonic -> seed -> identity -> key pairs -> addresses -> wipe

use didhd_core::{
    derive_key_pair, derive_sub_public_key, encode_address, generate_mnemonic_with,
    is_valid_address, is_valid_mnemonic, seed_from_mnemonic, ExtendedPublicKey, Language,
    MasterIdentity, SeededEntropy, Wipe, WordCount, ADDRESS_LEN,
};

#[test]
fn test_full_lifecycle_every_language() {
    for language in Language::ALL {
        let source = SeededEntropy::new([0x5Eu8; 32]);
        let mnemonic = generate_mnemonic_with(language, WordCount::Words12, &source).unwrap();
        assert!(is_valid_mnemonic(language, &mnemonic), "{}", language);

        let seed = seed_from_mnemonic(&mnemonic, "", language).unwrap();
        let mut identity = MasterIdentity::from_seed(seed.as_slice(), 0).unwrap();

        let mut pair = derive_key_pair(&identity, 0, 0, 0).unwrap();
        assert!(pair.address().len() < ADDRESS_LEN);
        assert!(is_valid_address(pair.address()));
        assert_eq!(encode_address(pair.public_key()).unwrap(), pair.address());

        pair.wipe();
        identity.wipe();
        assert!(identity.is_wiped());
    }
}

#[test]
fn test_recovery_reproduces_addresses() {
    let source = SeededEntropy::new([0x01u8; 32]);
    let mnemonic = generate_mnemonic_with(Language::English, WordCount::Words24, &source).unwrap();

    let original = MasterIdentity::from_mnemonic(&mnemonic, "pass", Language::English, 0).unwrap();
    let addresses: Vec<String> = (0..5)
        .map(|i| derive_key_pair(&original, 0, 0, i).unwrap().address().to_string())
        .collect();
    drop(original);

    // Same words, same passphrase, new process
    let recovered = MasterIdentity::from_mnemonic(&mnemonic, "pass", Language::English, 0).unwrap();
    for (i, address) in addresses.iter().enumerate() {
        let pair = derive_key_pair(&recovered, 0, 0, i as u32).unwrap();
        assert_eq!(pair.address(), address);
    }

    // Wrong passphrase recovers a different wallet
    let other = MasterIdentity::from_mnemonic(&mnemonic, "", Language::English, 0).unwrap();
    assert_ne!(derive_key_pair(&other, 0, 0, 0).unwrap().address(), addresses[0]);
}

#[test]
fn test_watch_only_addresses_match_private_side() {
    let identity = MasterIdentity::from_seed(&[0x77u8; 64], 0).unwrap();
    let xpub = identity.extended_public_key().unwrap().to_base58();

    // A watch-only holder only ever sees the xpub
    let watch = ExtendedPublicKey::from_base58(&xpub).unwrap();
    for index in 0..3 {
        let public_key = watch.derive_public(0, index).unwrap();
        assert_eq!(public_key, derive_sub_public_key(&identity, 0, index).unwrap());
        assert_eq!(
            encode_address(&public_key).unwrap(),
            derive_key_pair(&identity, 0, 0, index).unwrap().address()
        );
    }
}

#[test]
fn test_namespace_isolation() {
    let seed = [0x19u8; 64];
    let a = MasterIdentity::from_seed(&seed, 0).unwrap();
    let b = MasterIdentity::from_seed(&seed, 2).unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());

    let pair_a = derive_key_pair(&a, 0, 0, 0).unwrap();
    let pair_b = derive_key_pair(&b, 2, 0, 0).unwrap();
    assert_ne!(pair_a.private_key(), pair_b.private_key());
    assert_ne!(pair_a.address(), pair_b.address());
}
