//! Secure erasure of key material
//!
//! Clearing goes through `zeroize`, whose volatile writes and compiler
//! fence cannot be optimized away.

use crate::identity::MasterIdentity;
use crate::keys::DerivedKeyPair;

/// Overwrite every field holding key material with zeros.
pub trait Wipe {
    fn wipe(&mut self);
}

impl Wipe for MasterIdentity {
    /// Clears seed, chain code, public key and fingerprints. Derivation
    /// from a wiped identity fails with `InvalidArgument`.
    fn wipe(&mut self) {
        self.clear();
        log::trace!("Identity wiped");
    }
}

impl Wipe for DerivedKeyPair {
    /// Clears private key, public key and address.
    fn wipe(&mut self) {
        self.clear();
    }
}

pub fn wipe_identity(identity: &mut MasterIdentity) {
    identity.wipe();
}

pub fn wipe_key_pair(pair: &mut DerivedKeyPair) {
    pair.wipe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_key_pair;

    #[test]
    fn test_wipe_identity_clears_everything() {
        let mut identity = MasterIdentity::from_seed(&[0x42u8; 64], 0).unwrap();
        assert!(!identity.is_wiped());

        wipe_identity(&mut identity);

        assert!(identity.is_wiped());
        assert_eq!(identity.seed(), &[0u8; 64]);
        assert_eq!(identity.chain_code(), &[0u8; 32]);
        assert_eq!(identity.public_key(), &[0u8; 33]);
        assert_eq!(identity.fingerprint(), 0);
    }

    #[test]
    fn test_wipe_key_pair_clears_everything() {
        let identity = MasterIdentity::from_seed(&[0x42u8; 64], 0).unwrap();
        let mut pair = derive_key_pair(&identity, 0, 0, 0).unwrap();
        assert!(!pair.address().is_empty());

        wipe_key_pair(&mut pair);

        assert_eq!(pair.private_key(), &[0u8; 32]);
        assert_eq!(pair.public_key(), &[0u8; 33]);
        assert!(pair.address().is_empty());
    }

    #[test]
    fn test_wipe_is_idempotent() {
        let mut identity = MasterIdentity::from_seed(&[0x42u8; 64], 0).unwrap();
        identity.wipe();
        identity.wipe();
        assert!(identity.is_wiped());
    }
}
