//! Leaf key derivation
//!
//! Every leaf lives at `m/44'/coin_type'/0'/chain/index`: the identity
//! levels are hardened, `chain` and `index` are not. Private keys are
//! re-derived from the identity's seed; public keys come from the identity
//! node alone.

use std::fmt;

use secp256k1::{PublicKey, Secp256k1};
use zeroize::{Zeroize, Zeroizing};

use crate::address::encode_address;
use crate::ckd::{self, ChainCode, PrivateNode, HARDENED};
use crate::identity::{MasterIdentity, ACCOUNT, PURPOSE};
use crate::{HdKeyError, Result, PRIVATEKEY_BYTES, PUBLICKEY_BYTES};

/// Depth of the identity node (m/44'/coin'/0')
const IDENTITY_DEPTH: u8 = 3;

/// A leaf position: coin type, chain (0 external, 1 change), index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPath {
    pub coin_type: u32,
    pub chain: u32,
    pub index: u32,
}

impl KeyPath {
    pub fn new(coin_type: u32, chain: u32, index: u32) -> Result<Self> {
        Ok(Self {
            coin_type: ckd::check_index(coin_type, "coin type")?,
            chain: ckd::check_index(chain, "chain")?,
            index: ckd::check_index(index, "index")?,
        })
    }

    /// Raw BIP-32 child numbers, hardened bits included
    pub(crate) fn child_numbers(&self) -> [u32; 5] {
        [
            PURPOSE | HARDENED,
            self.coin_type | HARDENED,
            ACCOUNT | HARDENED,
            self.chain,
            self.index,
        ]
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            PURPOSE, self.coin_type, ACCOUNT, self.chain, self.index
        )
    }
}

/// A derived private/public key pair and its address.
///
/// The private key is zeroized on drop; [`crate::Wipe::wipe`] clears every field.
pub struct DerivedKeyPair {
    public_key: [u8; PUBLICKEY_BYTES],
    private_key: Zeroizing<[u8; PRIVATEKEY_BYTES]>,
    address: String,
}

impl DerivedKeyPair {
    pub fn public_key(&self) -> &[u8; PUBLICKEY_BYTES] {
        &self.public_key
    }

    /// 32-byte big-endian scalar
    pub fn private_key(&self) -> &[u8; PRIVATEKEY_BYTES] {
        &self.private_key
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn clear(&mut self) {
        self.private_key.zeroize();
        self.public_key.zeroize();
        self.address.zeroize();
    }
}

impl fmt::Debug for DerivedKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyPair")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Walk from the identity's seed down to one leaf.
fn derive_leaf(identity: &MasterIdentity, path: &KeyPath) -> Result<PrivateNode> {
    identity.ensure_live()?;

    let secp = Secp256k1::new();
    let master = ckd::master_node(identity.seed())?;
    let leaf = master.derive_path(&secp, &path.child_numbers())?;

    log::trace!("Derived private key at {}", path);
    Ok(leaf)
}

/// Derive the private key at `m/44'/coin_type'/0'/chain/index`.
///
/// # Errors
/// - `InvalidArgument` for an index with the hardened bit set or a wiped identity
/// - `DerivationOverflow` if a step lands outside the curve order; retry
///   with another index
pub fn derive_sub_private_key(
    identity: &MasterIdentity,
    coin_type: u32,
    chain: u32,
    index: u32,
) -> Result<Zeroizing<[u8; PRIVATEKEY_BYTES]>> {
    let path = KeyPath::new(coin_type, chain, index)?;
    let leaf = derive_leaf(identity, &path)?;
    Ok(Zeroizing::new(*leaf.secret()))
}

/// Derive the public key at `<identity>/chain/index` without the seed.
///
/// Matches the public half of [`derive_sub_private_key`] for the identity's
/// own coin type.
pub fn derive_sub_public_key(
    identity: &MasterIdentity,
    chain: u32,
    index: u32,
) -> Result<[u8; PUBLICKEY_BYTES]> {
    let chain = ckd::check_index(chain, "chain")?;
    let index = ckd::check_index(index, "index")?;
    identity.ensure_live()?;

    let parent = PublicKey::from_slice(identity.public_key())
        .map_err(|e| HdKeyError::InvalidPublicKey(e.to_string()))?;
    let chain_code = ChainCode(*identity.chain_code());

    derive_public_leaf(&parent, &chain_code, IDENTITY_DEPTH, chain, index)
}

/// Two non-hardened steps below a public node.
pub(crate) fn derive_public_leaf(
    parent: &PublicKey,
    chain_code: &ChainCode,
    depth: u8,
    chain: u32,
    index: u32,
) -> Result<[u8; PUBLICKEY_BYTES]> {
    let secp = Secp256k1::new();
    let (chain_key, chain_chain_code) = ckd::ckd_pub(&secp, parent, chain_code, depth + 1, chain)?;
    let (leaf, _) = ckd::ckd_pub(&secp, &chain_key, &chain_chain_code, depth + 2, index)?;
    Ok(leaf.serialize())
}

/// Derive the private key, public key and address at one path.
pub fn derive_key_pair(
    identity: &MasterIdentity,
    coin_type: u32,
    chain: u32,
    index: u32,
) -> Result<DerivedKeyPair> {
    let path = KeyPath::new(coin_type, chain, index)?;
    let leaf = derive_leaf(identity, &path)?;

    let public_key = leaf.public_key.serialize();
    let address = encode_address(&public_key)?;

    Ok(DerivedKeyPair {
        public_key,
        private_key: Zeroizing::new(*leaf.secret()),
        address,
    })
}
