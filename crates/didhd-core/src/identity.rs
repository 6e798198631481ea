//! Identity root keys
//!
//! A [`MasterIdentity`] is the account node `m/44'/coin_type'/0'` of a seed's
//! key tree. It keeps the public half of that node (public key and chain code)
//! for public derivation, and the seed itself for private re-derivation.

use secp256k1::Secp256k1;

use crate::ckd::{self, HARDENED};
use crate::memory::LockedBox;
use crate::mnemonic::Language;
use crate::seed::seed_from_mnemonic;
use crate::{HdKeyError, Result, PUBLICKEY_BYTES, SEED_BYTES};

/// BIP-44 purpose level
pub const PURPOSE: u32 = 44;

/// Account level used for every identity
pub const ACCOUNT: u32 = 0;

/// Root of a coin type's key tree.
///
/// Immutable after construction except for [`crate::Wipe::wipe`]; secret
/// fields are zeroized on drop.
pub struct MasterIdentity {
    fingerprint: u32,
    parent_fingerprint: u32,
    coin_type: u32,
    chain_code: LockedBox<32>,
    public_key: [u8; PUBLICKEY_BYTES],
    seed: LockedBox<SEED_BYTES>,
}

impl MasterIdentity {
    /// Build the identity for `coin_type` from a 64-byte seed.
    ///
    /// # Errors
    /// - `InvalidSeed` if the seed is not 64 bytes, is all zero, or yields an
    ///   out-of-range master key
    /// - `InvalidArgument` if `coin_type` has the hardened bit set
    /// - `DerivationOverflow` if an account-path step is out of range
    pub fn from_seed(seed: &[u8], coin_type: u32) -> Result<Self> {
        ckd::check_seed(seed)?;
        ckd::check_index(coin_type, "coin type")?;

        let secp = Secp256k1::new();
        let master = ckd::master_node(seed)?;
        let coin_node = master.derive_path(&secp, &[PURPOSE | HARDENED, coin_type | HARDENED])?;
        let account = coin_node.ckd_priv(&secp, ACCOUNT | HARDENED)?;

        let parent_fingerprint = ckd::fingerprint(&coin_node.public_key.serialize());
        let public_key = account.public_key.serialize();

        let mut seed_box = LockedBox::<SEED_BYTES>::zeroed();
        seed_box.as_mut_array().copy_from_slice(seed);

        log::debug!("Built identity for coin type {}", coin_type);

        Ok(Self {
            fingerprint: ckd::fingerprint(&public_key),
            parent_fingerprint,
            coin_type,
            chain_code: LockedBox::from_array(&account.chain_code.0),
            public_key,
            seed: seed_box,
        })
    }

    /// Parse a mnemonic, derive its seed and build the identity.
    pub fn from_mnemonic(
        mnemonic: &str,
        passphrase: &str,
        language: Language,
        coin_type: u32,
    ) -> Result<Self> {
        let seed = seed_from_mnemonic(mnemonic, passphrase, language)?;
        Self::from_seed(seed.as_slice(), coin_type)
    }

    /// First four bytes of HASH160(public key)
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Fingerprint of the `m/44'/coin_type'` node
    pub fn parent_fingerprint(&self) -> u32 {
        self.parent_fingerprint
    }

    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        self.chain_code.as_array()
    }

    /// Compressed public key of the account node
    pub fn public_key(&self) -> &[u8; PUBLICKEY_BYTES] {
        &self.public_key
    }

    pub fn seed(&self) -> &[u8; SEED_BYTES] {
        self.seed.as_array()
    }

    /// Whether [`crate::Wipe::wipe`] has cleared this identity
    pub fn is_wiped(&self) -> bool {
        self.seed.is_zero()
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_wiped() {
            return Err(HdKeyError::InvalidArgument("identity has been wiped".into()));
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        use zeroize::Zeroize;

        self.seed.zeroize();
        self.chain_code.zeroize();
        self.public_key.zeroize();
        self.fingerprint = 0;
        self.parent_fingerprint = 0;
        self.coin_type = 0;
    }
}

impl std::fmt::Debug for MasterIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterIdentity")
            .field("fingerprint", &format_args!("{:08x}", self.fingerprint))
            .field("coin_type", &self.coin_type)
            .field("seed", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
