//! BIP-39 seed derivation
//!
//! PBKDF2-HMAC-SHA512 with 2048 iterations, salted with `"mnemonic"` plus
//! the passphrase, both NFKD-normalized.

use zeroize::Zeroizing;

use crate::mnemonic::{self, Language};
use crate::{Result, SEED_BYTES};

/// A 64-byte seed, zeroized when dropped
pub type Seed = Zeroizing<[u8; SEED_BYTES]>;

/// Derive seed bytes from a mnemonic (with optional passphrase).
///
/// The phrase is checked against the language's wordlist and checksum first;
/// nothing is derived from an invalid phrase.
pub fn seed_from_mnemonic(mnemonic: &str, passphrase: &str, language: Language) -> Result<Seed> {
    let parsed = mnemonic::parse(language, mnemonic)?;
    Ok(Zeroizing::new(parsed.to_seed(passphrase)))
}
