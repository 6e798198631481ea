//! BIP-32 extended keys
//!
//! Serialized layout (78 bytes, then a 4-byte double-SHA-256 checksum):
//!
//! | bytes  | field                                           |
//! |--------|-------------------------------------------------|
//! | 0..4   | version 0x0488B21E (xpub) or 0x0488ADE4 (xprv)  |
//! | 4      | depth                                           |
//! | 5..9   | parent fingerprint                              |
//! | 9..13  | child number                                    |
//! | 13..45 | chain code                                      |
//! | 45..78 | compressed pubkey (xpub), 0x00 + scalar (xprv)  |

use std::fmt;

use bitcoin::base58;
use bitcoin::hashes::{sha256d, Hash};
use secp256k1::{PublicKey, Secp256k1};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::encode_address;
use crate::ckd::{self, ChainCode, PrivateNode, HARDENED};
use crate::identity::{MasterIdentity, ACCOUNT};
use crate::keys::derive_public_leaf;
use crate::path::DerivationPath;
use crate::wipe::Wipe;
use crate::{HdKeyError, Result, EXTENDED_KEY_BYTES, PRIVATEKEY_BYTES, PUBLICKEY_BYTES};

/// Mainnet xpub version bytes
const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

/// Mainnet xprv version bytes
const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];

const PAYLOAD_BYTES: usize = 78;

/// A public node of the key tree, shareable for watch-only derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub depth: u8,
    pub parent_fingerprint: u32,
    /// Raw child number, hardened bit included
    pub child_number: u32,
    pub chain_code: [u8; 32],
    pub public_key: [u8; PUBLICKEY_BYTES],
}

impl MasterIdentity {
    /// The identity node as an extended public key (depth 3, child 0').
    pub fn extended_public_key(&self) -> Result<ExtendedPublicKey> {
        self.ensure_live()?;
        Ok(ExtendedPublicKey {
            depth: 3,
            parent_fingerprint: self.parent_fingerprint(),
            child_number: ACCOUNT | HARDENED,
            chain_code: *self.chain_code(),
            public_key: *self.public_key(),
        })
    }

    /// The identity node as an extended private key.
    ///
    /// Anyone holding the result can derive every leaf private key of this
    /// coin type; treat it like the mnemonic.
    pub fn extended_private_key(&self) -> Result<ExtendedPrivateKey> {
        self.ensure_live()?;
        ExtendedPrivateKey::master(self.seed())?
            .derive_path(&DerivationPath::identity(self.coin_type())?)
    }
}

fn verify_checksum(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() != EXTENDED_KEY_BYTES {
        return Err(HdKeyError::InvalidArgument(format!(
            "extended key must be {} bytes, got {}",
            EXTENDED_KEY_BYTES,
            bytes.len()
        )));
    }

    let checksum = sha256d::Hash::hash(&bytes[..PAYLOAD_BYTES]).to_byte_array();
    if checksum[..4] != bytes[PAYLOAD_BYTES..] {
        return Err(HdKeyError::InvalidArgument("extended key checksum mismatch".into()));
    }
    Ok(&bytes[..PAYLOAD_BYTES])
}

fn append_checksum(out: &mut [u8; EXTENDED_KEY_BYTES]) {
    let checksum = sha256d::Hash::hash(&out[..PAYLOAD_BYTES]).to_byte_array();
    out[PAYLOAD_BYTES..].copy_from_slice(&checksum[..4]);
}

fn decode_base58_payload(encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    let payload = Zeroizing::new(
        base58::decode_check(encoded)
            .map_err(|e| HdKeyError::InvalidArgument(format!("invalid extended key: {}", e)))?,
    );
    if payload.len() != PAYLOAD_BYTES {
        return Err(HdKeyError::InvalidArgument(format!(
            "extended key payload must be {} bytes, got {}",
            PAYLOAD_BYTES,
            payload.len()
        )));
    }
    Ok(payload)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl ExtendedPublicKey {
    /// 82 bytes: payload plus checksum
    pub fn serialize(&self) -> [u8; EXTENDED_KEY_BYTES] {
        let mut out = [0u8; EXTENDED_KEY_BYTES];
        out[0..4].copy_from_slice(&XPUB_VERSION);
        out[4] = self.depth;
        out[5..9].copy_from_slice(&self.parent_fingerprint.to_be_bytes());
        out[9..13].copy_from_slice(&self.child_number.to_be_bytes());
        out[13..45].copy_from_slice(&self.chain_code);
        out[45..78].copy_from_slice(&self.public_key);
        append_checksum(&mut out);
        out
    }

    /// Parse the 82-byte form, verifying checksum, version and point.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_payload(verify_checksum(bytes)?)
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload[0..4] != XPUB_VERSION {
            return Err(HdKeyError::InvalidArgument(
                "not a mainnet extended public key".into(),
            ));
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let mut public_key = [0u8; PUBLICKEY_BYTES];
        public_key.copy_from_slice(&payload[45..78]);
        PublicKey::from_slice(&public_key)
            .map_err(|e| HdKeyError::InvalidPublicKey(e.to_string()))?;

        Ok(Self {
            depth: payload[4],
            parent_fingerprint: read_u32(&payload[5..9]),
            child_number: read_u32(&payload[9..13]),
            chain_code,
            public_key,
        })
    }

    /// Base58Check form (`xpub...`)
    pub fn to_base58(&self) -> String {
        base58::encode_check(&self.serialize()[..PAYLOAD_BYTES])
    }

    pub fn from_base58(encoded: &str) -> Result<Self> {
        Self::from_payload(&decode_base58_payload(encoded)?)
    }

    pub fn fingerprint(&self) -> u32 {
        ckd::fingerprint(&self.public_key)
    }

    /// The bare public key in Base58, without version or checksum.
    pub fn public_key_base58(&self) -> String {
        base58::encode(&self.public_key)
    }

    /// Public key at `<this node>/chain/index`.
    pub fn derive_public(&self, chain: u32, index: u32) -> Result<[u8; PUBLICKEY_BYTES]> {
        let chain = ckd::check_index(chain, "chain")?;
        let index = ckd::check_index(index, "index")?;
        if self.depth > u8::MAX - 2 {
            return Err(HdKeyError::InvalidArgument("derivation depth exceeds 255".into()));
        }

        let parent = PublicKey::from_slice(&self.public_key)
            .map_err(|e| HdKeyError::InvalidPublicKey(e.to_string()))?;
        derive_public_leaf(&parent, &ChainCode(self.chain_code), self.depth, chain, index)
    }

    /// Walk a path of normal steps below this node.
    ///
    /// # Errors
    /// `InvalidArgument` for a hardened step or a depth past 255.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        let secp = Secp256k1::new();
        let mut key = PublicKey::from_slice(&self.public_key)
            .map_err(|e| HdKeyError::InvalidPublicKey(e.to_string()))?;
        let mut chain_code = ChainCode(self.chain_code);
        let mut derived = self.clone();

        for &index in path.child_numbers() {
            let depth = derived.depth.checked_add(1).ok_or_else(|| {
                HdKeyError::InvalidArgument("derivation depth exceeds 255".into())
            })?;
            let (child, child_chain_code) = ckd::ckd_pub(&secp, &key, &chain_code, depth, index)?;

            derived.parent_fingerprint = ckd::fingerprint(&key.serialize());
            derived.depth = depth;
            derived.child_number = index;
            key = child;
            chain_code = child_chain_code;
        }

        derived.chain_code = chain_code.0;
        derived.public_key = key.serialize();
        Ok(derived)
    }
}

/// A private node of the key tree in BIP-32 extended form (`xprv...`).
///
/// The chain code and private key are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedPrivateKey {
    depth: u8,
    parent_fingerprint: u32,
    child_number: u32,
    chain_code: [u8; 32],
    private_key: [u8; PRIVATEKEY_BYTES],
    #[zeroize(skip)]
    public_key: [u8; PUBLICKEY_BYTES],
}

impl ExtendedPrivateKey {
    /// The root node `m` of a 64-byte seed.
    pub fn master(seed: &[u8]) -> Result<Self> {
        Ok(Self::from_node(&ckd::master_node(seed)?, 0, 0))
    }

    fn from_node(node: &PrivateNode, parent_fingerprint: u32, child_number: u32) -> Self {
        Self {
            depth: node.depth,
            parent_fingerprint,
            child_number,
            chain_code: node.chain_code.0,
            private_key: *node.secret(),
            public_key: node.public_key.serialize(),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> u32 {
        self.parent_fingerprint
    }

    /// Raw child number, hardened bit included
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// 32-byte big-endian scalar
    pub fn private_key(&self) -> &[u8; PRIVATEKEY_BYTES] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8; PUBLICKEY_BYTES] {
        &self.public_key
    }

    pub fn fingerprint(&self) -> u32 {
        ckd::fingerprint(&self.public_key)
    }

    /// Identity address of this node's public key
    pub fn address(&self) -> Result<String> {
        encode_address(&self.public_key)
    }

    pub fn private_key_base58(&self) -> Zeroizing<String> {
        Zeroizing::new(base58::encode(&self.private_key))
    }

    pub fn public_key_base58(&self) -> String {
        base58::encode(&self.public_key)
    }

    /// The public half of this node.
    pub fn to_extended_public_key(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            chain_code: self.chain_code,
            public_key: self.public_key,
        }
    }

    /// Walk a path below this node; hardened steps are allowed.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        let secp = Secp256k1::new();
        let mut node = PrivateNode::new(&secp, &self.private_key, &self.chain_code, self.depth)?;
        let mut parent_fingerprint = self.parent_fingerprint;
        let mut child_number = self.child_number;

        for &index in path.child_numbers() {
            parent_fingerprint = ckd::fingerprint(&node.public_key.serialize());
            node = node.ckd_priv(&secp, index)?;
            child_number = index;
        }

        log::trace!("Derived extended private key at depth {}", node.depth);
        Ok(Self::from_node(&node, parent_fingerprint, child_number))
    }

    /// 82 bytes: payload plus checksum
    pub fn serialize(&self) -> Zeroizing<[u8; EXTENDED_KEY_BYTES]> {
        let mut out = Zeroizing::new([0u8; EXTENDED_KEY_BYTES]);
        out[0..4].copy_from_slice(&XPRV_VERSION);
        out[4] = self.depth;
        out[5..9].copy_from_slice(&self.parent_fingerprint.to_be_bytes());
        out[9..13].copy_from_slice(&self.child_number.to_be_bytes());
        out[13..45].copy_from_slice(&self.chain_code);
        out[46..78].copy_from_slice(&self.private_key);
        append_checksum(&mut out);
        out
    }

    /// Parse the 82-byte form, verifying checksum, version and key range.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_payload(verify_checksum(bytes)?)
    }

    fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload[0..4] != XPRV_VERSION {
            return Err(HdKeyError::InvalidArgument(
                "not a mainnet extended private key".into(),
            ));
        }
        if payload[45] != 0 {
            return Err(HdKeyError::InvalidArgument(
                "extended private key must pad the scalar with 0x00".into(),
            ));
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let mut private_key = Zeroizing::new([0u8; PRIVATEKEY_BYTES]);
        private_key.copy_from_slice(&payload[46..78]);

        let node = PrivateNode::new(&Secp256k1::new(), &private_key, &chain_code, payload[4]);
        chain_code.zeroize();
        Ok(Self::from_node(&node?, read_u32(&payload[5..9]), read_u32(&payload[9..13])))
    }

    /// Base58Check form (`xprv...`)
    pub fn to_base58(&self) -> Zeroizing<String> {
        Zeroizing::new(base58::encode_check(&self.serialize()[..PAYLOAD_BYTES]))
    }

    pub fn from_base58(encoded: &str) -> Result<Self> {
        Self::from_payload(&decode_base58_payload(encoded)?)
    }
}

impl Wipe for ExtendedPrivateKey {
    /// Clears the private key, chain code, public key and metadata.
    fn wipe(&mut self) {
        self.zeroize();
        self.public_key.zeroize();
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("depth", &self.depth)
            .field("fingerprint", &format_args!("{:08x}", self.fingerprint()))
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{derive_key_pair, derive_sub_public_key};
    use bitcoin::bip32::{Xpriv, Xpub};
    use bitcoin::Network;

    fn identity() -> MasterIdentity {
        MasterIdentity::from_seed(&[0x42u8; 64], 0).unwrap()
    }

    fn bitcoin_xpriv(path: &str) -> Xpriv {
        let secp = Secp256k1::new();
        let path: bitcoin::bip32::DerivationPath = path.parse().unwrap();
        Xpriv::new_master(Network::Bitcoin, &[0x42u8; 64])
            .unwrap()
            .derive_priv(&secp, &path)
            .unwrap()
    }

    #[test]
    fn test_matches_bitcoin_xpub_string() {
        let secp = Secp256k1::new();
        let path: bitcoin::bip32::DerivationPath = "m/44'/0'/0'".parse().unwrap();
        let account = Xpriv::new_master(Network::Bitcoin, &[0x42u8; 64])
            .unwrap()
            .derive_priv(&secp, &path)
            .unwrap();
        let expected = Xpub::from_priv(&secp, &account).to_string();

        let xpub = identity().extended_public_key().unwrap();
        assert_eq!(xpub.to_base58(), expected);
        assert!(expected.starts_with("xpub"));
    }

    #[test]
    fn test_base58_round_trip() {
        let xpub = identity().extended_public_key().unwrap();
        let parsed = ExtendedPublicKey::from_base58(&xpub.to_base58()).unwrap();
        assert_eq!(parsed, xpub);
        assert_eq!(parsed.fingerprint(), identity().fingerprint());
    }

    #[test]
    fn test_binary_form() {
        let xpub = identity().extended_public_key().unwrap();
        let bytes = xpub.serialize();
        assert_eq!(bytes.len(), EXTENDED_KEY_BYTES);
        assert_eq!(ExtendedPublicKey::deserialize(&bytes).unwrap(), xpub);

        let mut tampered = bytes;
        tampered[50] ^= 0x01;
        assert!(ExtendedPublicKey::deserialize(&tampered).is_err());
        assert!(ExtendedPublicKey::deserialize(&bytes[..78]).is_err());
    }

    #[test]
    fn test_watch_only_derivation_matches_identity() {
        let identity = identity();
        let xpub = ExtendedPublicKey::from_base58(&identity.extended_public_key().unwrap().to_base58())
            .unwrap();

        for (chain, index) in [(0, 0), (0, 5), (1, 2)] {
            assert_eq!(
                xpub.derive_public(chain, index).unwrap(),
                derive_sub_public_key(&identity, chain, index).unwrap()
            );
        }
    }

    #[test]
    fn test_rejects_wrong_version() {
        let xpub = identity().extended_public_key().unwrap();
        let mut payload = xpub.serialize()[..PAYLOAD_BYTES].to_vec();
        // tpub version
        payload[0..4].copy_from_slice(&[0x04, 0x35, 0x87, 0xCF]);
        let encoded = base58::encode_check(&payload);
        assert!(matches!(
            ExtendedPublicKey::from_base58(&encoded),
            Err(HdKeyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_bad_point() {
        let mut xpub = identity().extended_public_key().unwrap();
        xpub.public_key = [0u8; PUBLICKEY_BYTES];
        xpub.public_key[0] = 0x02;
        assert!(matches!(
            ExtendedPublicKey::deserialize(&xpub.serialize()),
            Err(HdKeyError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_xpub_path_matches_bitcoin() {
        let secp = Secp256k1::new();
        let xpub = identity().extended_public_key().unwrap();
        let path: DerivationPath = "1/9".parse().unwrap();

        let expected = Xpub::from_priv(&secp, &bitcoin_xpriv("m/44'/0'/0'/1/9"));
        let derived = xpub.derive_path(&path).unwrap();
        assert_eq!(derived.to_base58(), expected.to_string());
        assert_eq!(derived.public_key, derive_sub_public_key(&identity(), 1, 9).unwrap());

        assert_eq!(xpub.derive_path(&DerivationPath::default()).unwrap(), xpub);
        assert!(matches!(
            xpub.derive_path(&"0H".parse().unwrap()),
            Err(HdKeyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_master_matches_bitcoin_xprv_string() {
        let expected = Xpriv::new_master(Network::Bitcoin, &[0x42u8; 64]).unwrap();
        let master = ExtendedPrivateKey::master(&[0x42u8; 64]).unwrap();
        assert_eq!(master.to_base58().as_str(), expected.to_string());
        assert_eq!(master.depth(), 0);
        assert!(master.to_base58().starts_with("xprv"));
    }

    #[test]
    fn test_identity_xprv_matches_bitcoin() {
        let identity = identity();
        let xprv = identity.extended_private_key().unwrap();

        assert_eq!(xprv.to_base58().as_str(), bitcoin_xpriv("m/44'/0'/0'").to_string());
        assert_eq!(xprv.to_extended_public_key(), identity.extended_public_key().unwrap());
        assert_eq!(xprv.fingerprint(), identity.fingerprint());
        assert_eq!(xprv.child_number(), HARDENED);
    }

    #[test]
    fn test_xprv_path_matches_key_pair() {
        let identity = identity();
        let master = ExtendedPrivateKey::master(identity.seed()).unwrap();

        let leaf = master.derive_path(&"44H/0H/0H/0/5".parse().unwrap()).unwrap();
        let pair = derive_key_pair(&identity, 0, 0, 5).unwrap();
        assert_eq!(leaf.private_key(), pair.private_key());
        assert_eq!(leaf.public_key(), pair.public_key());
        assert_eq!(leaf.address().unwrap(), pair.address());
        assert_eq!(leaf.to_base58().as_str(), bitcoin_xpriv("m/44'/0'/0'/0/5").to_string());

        // Walking in two legs lands on the same node
        let account = master.derive_path(&DerivationPath::identity(0).unwrap()).unwrap();
        let again = account.derive_path(&"0/5".parse().unwrap()).unwrap();
        assert_eq!(again.to_base58().as_str(), leaf.to_base58().as_str());
    }

    #[test]
    fn test_xprv_round_trip() {
        let xprv = identity().extended_private_key().unwrap();

        let parsed = ExtendedPrivateKey::from_base58(&xprv.to_base58()).unwrap();
        assert_eq!(parsed.private_key(), xprv.private_key());
        assert_eq!(parsed.chain_code(), xprv.chain_code());
        assert_eq!(parsed.parent_fingerprint(), xprv.parent_fingerprint());
        assert_eq!(parsed.depth(), 3);

        let bytes = xprv.serialize();
        assert_eq!(bytes[45], 0);
        let parsed = ExtendedPrivateKey::deserialize(bytes.as_slice()).unwrap();
        assert_eq!(parsed.to_base58().as_str(), xprv.to_base58().as_str());
    }

    #[test]
    fn test_xprv_rejects_malformed() {
        let xprv = identity().extended_private_key().unwrap();
        let xpub = identity().extended_public_key().unwrap();

        // Each kind refuses the other's version bytes
        assert!(ExtendedPrivateKey::from_base58(&xpub.to_base58()).is_err());
        assert!(ExtendedPublicKey::from_base58(&xprv.to_base58()).is_err());

        let mut payload = xprv.serialize()[..PAYLOAD_BYTES].to_vec();
        payload[45] = 0x01;
        assert!(ExtendedPrivateKey::from_base58(&base58::encode_check(&payload)).is_err());

        // Scalar of zero is not a private key
        payload[45] = 0x00;
        payload[46..78].fill(0);
        assert!(ExtendedPrivateKey::from_base58(&base58::encode_check(&payload)).is_err());

        let mut tampered = *xprv.serialize();
        tampered[60] ^= 0x01;
        assert!(ExtendedPrivateKey::deserialize(&tampered).is_err());
    }

    #[test]
    fn test_raw_key_base58() {
        let xprv = identity().extended_private_key().unwrap();
        let private = base58::decode(&xprv.private_key_base58()).unwrap();
        assert_eq!(private.as_slice(), xprv.private_key());

        let public = base58::decode(&xprv.public_key_base58()).unwrap();
        assert_eq!(public.as_slice(), xprv.public_key());
        assert_eq!(xprv.to_extended_public_key().public_key_base58(), xprv.public_key_base58());
    }

    #[test]
    fn test_xprv_debug_redacts() {
        let xprv = identity().extended_private_key().unwrap();
        let debug = format!("{:?}", xprv);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&hex::encode(xprv.private_key())));
    }

    #[test]
    fn test_xprv_wipe() {
        let mut xprv = identity().extended_private_key().unwrap();
        xprv.wipe();
        assert_eq!(xprv.private_key(), &[0u8; PRIVATEKEY_BYTES]);
        assert_eq!(xprv.chain_code(), &[0u8; 32]);
        assert_eq!(xprv.public_key(), &[0u8; PUBLICKEY_BYTES]);
        assert_eq!(xprv.depth(), 0);
    }

    #[test]
    fn test_wiped_identity_has_no_xprv() {
        let mut identity = identity();
        identity.clear();
        assert!(identity.extended_private_key().is_err());
    }
}
