//! didhd Core
//!
//! Hierarchical-deterministic identity keys for DID on an SPV wallet.
//!
//! # Key Derivation
//!
//! From a single BIP-39 seed:
//! - Identity node per coin type: m/44'/coin'/0'
//! - Leaf keys: m/44'/coin'/0'/chain/index
//!
//! Leaf public keys can be derived from the identity node alone, without
//! touching the seed. Both halves of a node export as BIP-32 extended keys
//! (`xpub`/`xprv`), and [`DerivationPath`] parses paths such as
//! `44H/0H/0H/0/5`.
//!
//! # Example
//!
//! ```
//! use didhd_core::{
//!     derive_key_pair, generate_mnemonic, seed_from_mnemonic, Language, MasterIdentity, Wipe,
//! };
//!
//! let mnemonic = generate_mnemonic(Language::English).unwrap();
//! let seed = seed_from_mnemonic(&mnemonic, "", Language::English).unwrap();
//!
//! let mut identity = MasterIdentity::from_seed(seed.as_slice(), 0).unwrap();
//! let mut pair = derive_key_pair(&identity, 0, 0, 0).unwrap();
//! assert!(pair.address().starts_with('i'));
//!
//! pair.wipe();
//! identity.wipe();
//! ```

pub mod address;
mod ckd;
pub mod entropy;
pub mod extended;
pub mod identity;
pub mod keys;
pub mod memory;
pub mod mnemonic;
pub mod path;
pub mod seed;
pub mod wipe;

pub use address::{decode_address, encode_address, encode_address_as, is_valid_address, AddressKind};
pub use entropy::{EntropySource, OsEntropy, SeededEntropy};
pub use extended::{ExtendedPrivateKey, ExtendedPublicKey};
pub use identity::MasterIdentity;
pub use keys::{
    derive_key_pair, derive_sub_private_key, derive_sub_public_key, DerivedKeyPair, KeyPath,
};
pub use mnemonic::{
    detect_language, generate_mnemonic, generate_mnemonic_with, is_valid_mnemonic,
    validate_mnemonic, Language, WordCount,
};
pub use path::DerivationPath;
pub use seed::{seed_from_mnemonic, Seed};
pub use wipe::{wipe_identity, wipe_key_pair, Wipe};

use thiserror::Error;

/// Compressed secp256k1 public key length
pub const PUBLICKEY_BYTES: usize = 33;

/// Big-endian secp256k1 scalar length
pub const PRIVATEKEY_BYTES: usize = 32;

/// BIP-39 seed length
pub const SEED_BYTES: usize = 64;

/// Address buffer size: at most 47 printable characters plus a terminator
pub const ADDRESS_LEN: usize = 48;

/// Serialized BIP-32 extended key: 78-byte payload plus 4-byte checksum
pub const EXTENDED_KEY_BYTES: usize = 82;

/// Errors from HD key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HdKeyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// The child key at this depth and index is out of range.
    /// Callers should retry with another index.
    #[error("Derivation overflow at depth {depth}, index {index}")]
    DerivationOverflow { depth: u8, index: u32 },

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

pub type Result<T> = std::result::Result<T, HdKeyError>;
