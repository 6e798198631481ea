//! Public key to address encoding
//!
//! ```text
//! script       = 0x21 || pubkey(33) || suffix
//! program_hash = version || RIPEMD160(SHA256(script))
//! address      = Base58Check(program_hash)
//! ```
//!
//! Identity (DID) addresses use version `0x67` and suffix `0xAD`, so they
//! always start with `i`. Standard wallet addresses use `0x21` / `0xAC`
//! (CHECKSIG) and start with `E`.

use bitcoin::base58;
use bitcoin::hashes::{hash160, Hash};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::{HdKeyError, Result, ADDRESS_LEN, PUBLICKEY_BYTES};

/// Push-33-bytes opcode that prefixes the key in the redeem script
const PUSH_PUBLICKEY: u8 = 0x21;

/// version byte + HASH160
const PROGRAM_HASH_LEN: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// DID identity address
    #[default]
    Identity,
    /// Standard single-signature wallet address
    Standard,
}

impl AddressKind {
    fn version(self) -> u8 {
        match self {
            Self::Identity => 0x67,
            Self::Standard => 0x21,
        }
    }

    fn script_suffix(self) -> u8 {
        match self {
            Self::Identity => 0xAD,
            Self::Standard => 0xAC,
        }
    }

    fn from_version(version: u8) -> Option<Self> {
        match version {
            0x67 => Some(Self::Identity),
            0x21 => Some(Self::Standard),
            _ => None,
        }
    }
}

/// Encode a compressed public key as an identity address.
pub fn encode_address(public_key: &[u8; PUBLICKEY_BYTES]) -> Result<String> {
    encode_address_as(public_key, AddressKind::Identity)
}

/// Encode a compressed public key as an address of the given kind.
///
/// # Errors
/// `InvalidPublicKey` if the bytes are not a valid compressed point.
pub fn encode_address_as(public_key: &[u8; PUBLICKEY_BYTES], kind: AddressKind) -> Result<String> {
    if !matches!(public_key[0], 0x02 | 0x03) {
        return Err(HdKeyError::InvalidPublicKey(format!(
            "bad compressed point prefix 0x{:02x}",
            public_key[0]
        )));
    }
    PublicKey::from_slice(public_key).map_err(|e| HdKeyError::InvalidPublicKey(e.to_string()))?;

    let mut script = [0u8; PUBLICKEY_BYTES + 2];
    script[0] = PUSH_PUBLICKEY;
    script[1..=PUBLICKEY_BYTES].copy_from_slice(public_key);
    script[PUBLICKEY_BYTES + 1] = kind.script_suffix();

    let mut program_hash = [0u8; PROGRAM_HASH_LEN];
    program_hash[0] = kind.version();
    program_hash[1..].copy_from_slice(&hash160::Hash::hash(&script).to_byte_array());

    let address = base58::encode_check(&program_hash);
    debug_assert!(address.len() < ADDRESS_LEN);
    Ok(address)
}

/// Decode an address into its kind and 20-byte key hash.
///
/// # Errors
/// `InvalidArgument` for bad Base58, a checksum mismatch, a wrong length or
/// an unknown version byte.
pub fn decode_address(address: &str) -> Result<(AddressKind, [u8; 20])> {
    if address.is_empty() || address.len() >= ADDRESS_LEN {
        return Err(HdKeyError::InvalidArgument(format!(
            "address length {} out of range",
            address.len()
        )));
    }

    let payload = base58::decode_check(address)
        .map_err(|e| HdKeyError::InvalidArgument(format!("invalid address: {}", e)))?;
    if payload.len() != PROGRAM_HASH_LEN {
        return Err(HdKeyError::InvalidArgument(format!(
            "invalid address payload length {}",
            payload.len()
        )));
    }

    let kind = AddressKind::from_version(payload[0]).ok_or_else(|| {
        HdKeyError::InvalidArgument(format!("unknown address version 0x{:02x}", payload[0]))
    })?;

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok((kind, hash))
}

/// Whether `address` is a well-formed address of any supported kind.
pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}
