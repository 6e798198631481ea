//! BIP-32 child key derivation primitives
//!
//! Private derivation:
//!   I = HMAC-SHA512(key=chain_code, data=0x00 || ser_256(k) || ser_32(i))   (hardened)
//!   I = HMAC-SHA512(key=chain_code, data=ser_P(K) || ser_32(i))             (normal)
//!   k_child = parse_256(I_L) + k (mod n),  c_child = I_R
//!
//! Public derivation (normal indices only):
//!   K_child = parse_256(I_L) * G + K
//!
//! Every intermediate secret (HMAC output, tweak scalar, transient
//! `SecretKey`) is zeroed before the function that produced it returns.

use bitcoin::hashes::{sha512, Hash, HashEngine, Hmac, HmacEngine};
use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{HdKeyError, Result, PRIVATEKEY_BYTES, SEED_BYTES};

/// First hardened child index (2^31)
pub(crate) const HARDENED: u32 = 0x8000_0000;

/// BIP-32 master key HMAC key
const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

/// 32-byte chain code, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct ChainCode(pub(crate) [u8; 32]);

impl ChainCode {
    fn from_hmac_right(ir: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(ir);
        ChainCode(bytes)
    }
}

/// secp256k1 value types that are a bare 32-byte array with no drop glue.
trait KeyBytes: Copy {}

impl KeyBytes for SecretKey {}
impl KeyBytes for Scalar {}

const _: () = assert!(
    std::mem::size_of::<SecretKey>() == 32 && std::mem::size_of::<Scalar>() == 32
);

/// Zero a `SecretKey` or `Scalar` in place with volatile writes.
///
/// The value is left as all-zero bytes and must not be used afterwards.
fn erase<T: KeyBytes>(value: &mut T) {
    // SAFETY: T is a 32-byte plain array newtype (asserted above), so viewing
    // it as bytes is sound and any byte pattern is a valid `[u8; 32]`
    let bytes = unsafe {
        std::slice::from_raw_parts_mut((value as *mut T).cast::<u8>(), std::mem::size_of::<T>())
    };
    bytes.zeroize();
}

/// HMAC-SHA512 of `parts` under `key`, copied into a zeroizing buffer.
fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    let mut engine = HmacEngine::<sha512::Hash>::new(key);
    for part in parts {
        engine.input(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&Hmac::from_engine(engine)[..]);
    out
}

/// A private node of the key tree.
///
/// The secret is held as raw bytes and zeroized on drop; a `SecretKey` is
/// rebuilt only for the tweak addition and erased right after.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct PrivateNode {
    secret: [u8; PRIVATEKEY_BYTES],
    pub(crate) chain_code: ChainCode,
    #[zeroize(skip)]
    pub(crate) public_key: PublicKey,
    pub(crate) depth: u8,
}

/// Reject indices that already carry the hardened bit.
pub(crate) fn check_index(value: u32, what: &str) -> Result<u32> {
    if value >= HARDENED {
        return Err(HdKeyError::InvalidArgument(format!(
            "{} {} out of range (must be < 2^31)",
            what, value
        )));
    }
    Ok(value)
}

/// Reject seeds of the wrong length and the all-zero seed.
pub(crate) fn check_seed(seed: &[u8]) -> Result<()> {
    if seed.len() != SEED_BYTES {
        return Err(HdKeyError::InvalidSeed(format!(
            "expected {} bytes, got {}",
            SEED_BYTES,
            seed.len()
        )));
    }
    if seed.iter().all(|&b| b == 0) {
        return Err(HdKeyError::InvalidSeed("seed is all zero".into()));
    }
    Ok(())
}

/// Parse I_L as a scalar; values >= n are rejected.
fn tweak_from_hmac_left(il: &[u8], depth: u8, index: u32) -> Result<Scalar> {
    let mut arr = [0u8; 32];
    arr.copy_from_slice(il);
    let tweak = Scalar::from_be_bytes(arr).map_err(|_| HdKeyError::DerivationOverflow { depth, index });
    arr.zeroize();
    tweak
}

/// Derive the master node: I = HMAC-SHA512("Bitcoin seed", seed).
pub(crate) fn master_node(seed: &[u8]) -> Result<PrivateNode> {
    check_seed(seed)?;

    let i = hmac_sha512(MASTER_KEY_SALT, &[seed]);

    // I_L of zero or >= n makes the seed unusable as a master key
    let mut secret = [0u8; PRIVATEKEY_BYTES];
    secret.copy_from_slice(&i[..32]);
    let node = PrivateNode::new(&Secp256k1::new(), &secret, &i[32..], 0)
        .map_err(|_| HdKeyError::InvalidSeed("master key out of range".into()));
    secret.zeroize();
    node
}

impl PrivateNode {
    /// Build a node from raw key material, validating the secret.
    ///
    /// `secret` is copied; the caller clears its own buffer.
    pub(crate) fn new(
        secp: &Secp256k1<All>,
        secret: &[u8; PRIVATEKEY_BYTES],
        chain_code: &[u8],
        depth: u8,
    ) -> Result<Self> {
        let mut key = SecretKey::from_slice(secret)
            .map_err(|_| HdKeyError::InvalidArgument("private key out of range".into()))?;
        let public_key = PublicKey::from_secret_key(secp, &key);
        erase(&mut key);

        Ok(Self {
            secret: *secret,
            chain_code: ChainCode::from_hmac_right(chain_code),
            public_key,
            depth,
        })
    }

    /// 32-byte big-endian secret scalar
    pub(crate) fn secret(&self) -> &[u8; PRIVATEKEY_BYTES] {
        &self.secret
    }

    /// Derive a child. `index` is the raw child number (hardened bit included).
    pub(crate) fn ckd_priv(&self, secp: &Secp256k1<All>, index: u32) -> Result<PrivateNode> {
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            HdKeyError::InvalidArgument("derivation depth exceeds 255".into())
        })?;

        let index_bytes = index.to_be_bytes();
        let i = if index >= HARDENED {
            hmac_sha512(&self.chain_code.0, &[&[0u8], &self.secret, &index_bytes])
        } else {
            hmac_sha512(&self.chain_code.0, &[&self.public_key.serialize(), &index_bytes])
        };

        let mut tweak = tweak_from_hmac_left(&i[..32], depth, index)?;
        let mut parent = match SecretKey::from_slice(&self.secret) {
            Ok(key) => key,
            Err(_) => {
                erase(&mut tweak);
                return Err(HdKeyError::InvalidArgument("private key out of range".into()));
            }
        };
        // A zero child key is the other invalid outcome
        let child = parent
            .add_tweak(&tweak)
            .map_err(|_| HdKeyError::DerivationOverflow { depth, index });
        erase(&mut tweak);
        erase(&mut parent);

        let mut child = child?;
        let mut secret = child.secret_bytes();
        erase(&mut child);
        let node = Self::new(secp, &secret, &i[32..], depth);
        secret.zeroize();
        node
    }

    /// Walk a sequence of raw child numbers.
    pub(crate) fn derive_path(&self, secp: &Secp256k1<All>, path: &[u32]) -> Result<PrivateNode> {
        let mut iter = path.iter();
        let first = match iter.next() {
            Some(&index) => self.ckd_priv(secp, index)?,
            None => return Err(HdKeyError::InvalidArgument("empty derivation path".into())),
        };
        iter.try_fold(first, |node, &index| node.ckd_priv(secp, index))
    }
}

/// Public child derivation for a normal (non-hardened) index.
///
/// Returns the child public key and chain code.
pub(crate) fn ckd_pub(
    secp: &Secp256k1<All>,
    parent: &PublicKey,
    chain_code: &ChainCode,
    depth: u8,
    index: u32,
) -> Result<(PublicKey, ChainCode)> {
    if index >= HARDENED {
        return Err(HdKeyError::InvalidArgument(
            "hardened public derivation is impossible without the private key".into(),
        ));
    }

    let i = hmac_sha512(&chain_code.0, &[&parent.serialize(), &index.to_be_bytes()]);
    let mut tweak = tweak_from_hmac_left(&i[..32], depth, index)?;

    // parent + tweak*G; the point at infinity is rejected
    let child = parent
        .add_exp_tweak(secp, &tweak)
        .map_err(|_| HdKeyError::DerivationOverflow { depth, index });
    erase(&mut tweak);

    Ok((child?, ChainCode::from_hmac_right(&i[32..])))
}

/// BIP-32 key identifier fingerprint: first four bytes of HASH160(pubkey).
pub(crate) fn fingerprint(public_key: &[u8]) -> u32 {
    let hash = bitcoin::hashes::hash160::Hash::hash(public_key).to_byte_array();
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv, Xpub};
    use bitcoin::Network;
    use std::mem::ManuallyDrop;

    fn read_raw(ptr: *const u8, len: usize) -> Vec<u8> {
        (0..len)
            // SAFETY: callers pass a pointer into a live allocation of `len` bytes
            .map(|i| unsafe { std::ptr::read_volatile(ptr.add(i)) })
            .collect()
    }

    fn test_seed(byte: u8) -> [u8; 64] {
        let mut seed = [0u8; 64];
        for (i, b) in seed.iter_mut().enumerate() {
            *b = byte ^ (i as u8);
        }
        seed
    }

    #[test]
    fn test_master_matches_bip32() {
        let seed = test_seed(0xAB);
        let node = master_node(&seed).unwrap();
        let xpriv = Xpriv::new_master(Network::Bitcoin, &seed).unwrap();

        assert_eq!(*node.secret(), xpriv.private_key.secret_bytes());
        assert_eq!(node.chain_code.0, xpriv.chain_code.to_bytes());
    }

    #[test]
    fn test_private_path_matches_bip32() {
        let secp = Secp256k1::new();
        let seed = test_seed(0x01);
        let master = master_node(&seed).unwrap();

        let node = master
            .derive_path(&secp, &[44 | HARDENED, 7 | HARDENED, HARDENED, 1, 42])
            .unwrap();

        let path: DerivationPath = "m/44'/7'/0'/1/42".parse().unwrap();
        let expected = Xpriv::new_master(Network::Bitcoin, &seed)
            .unwrap()
            .derive_priv(&secp, &path)
            .unwrap();

        assert_eq!(*node.secret(), expected.private_key.secret_bytes());
        assert_eq!(node.chain_code.0, expected.chain_code.to_bytes());
        assert_eq!(node.depth, 5);
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let secp = Secp256k1::new();
        let master = master_node(&test_seed(0x5A)).unwrap();

        for index in [0u32, 1, 7, 1000, HARDENED - 1] {
            let child = master.ckd_priv(&secp, index).unwrap();
            let (child_pub, chain_code) =
                ckd_pub(&secp, &master.public_key, &master.chain_code, 1, index).unwrap();

            assert_eq!(child.public_key, child_pub, "index {}", index);
            assert_eq!(child.chain_code.0, chain_code.0);
        }
    }

    #[test]
    fn test_public_derivation_matches_xpub() {
        let secp = Secp256k1::new();
        let seed = [0xABu8; 64];
        let master = master_node(&seed).unwrap();
        let xpub = Xpub::from_priv(&secp, &Xpriv::new_master(Network::Bitcoin, &seed).unwrap());

        let (child, _) =
            ckd_pub(&secp, &master.public_key, &master.chain_code, 1, 5).unwrap();
        let expected = xpub.ckd_pub(&secp, ChildNumber::Normal { index: 5 }).unwrap();
        assert_eq!(child.serialize(), expected.public_key.serialize());
    }

    #[test]
    fn test_hardened_public_derivation_rejected() {
        let secp = Secp256k1::new();
        let master = master_node(&test_seed(0x10)).unwrap();
        let result = ckd_pub(&secp, &master.public_key, &master.chain_code, 1, HARDENED);
        assert!(matches!(result, Err(HdKeyError::InvalidArgument(_))));
    }

    #[test]
    fn test_hmac_left_out_of_range() {
        // The curve order n itself is not a valid tweak
        let curve_order: [u8; 32] = [
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C,
            0xD0, 0x36, 0x41, 0x41,
        ];
        assert_eq!(
            tweak_from_hmac_left(&curve_order, 3, 9).unwrap_err(),
            HdKeyError::DerivationOverflow { depth: 3, index: 9 }
        );
        assert!(tweak_from_hmac_left(&[0xFF; 32], 1, 0).is_err());
        assert!(tweak_from_hmac_left(&[0u8; 32], 1, 0).is_ok());
    }

    #[test]
    fn test_zero_child_key_is_overflow() {
        // k + tweak == 0 (mod n) when tweak == n - k
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x01; 32]).unwrap();
        let negated = secret.negate();
        let tweak = Scalar::from_be_bytes(negated.secret_bytes()).unwrap();
        assert!(secret.add_tweak(&tweak).is_err());

        // Same for the public side: K + (-K) is the point at infinity
        let public = secret.public_key(&secp);
        assert!(public.add_exp_tweak(&secp, &tweak).is_err());
    }

    #[test]
    fn test_check_seed() {
        assert!(matches!(check_seed(&[1u8; 32]), Err(HdKeyError::InvalidSeed(_))));
        assert!(matches!(check_seed(&[0u8; 64]), Err(HdKeyError::InvalidSeed(_))));
        assert!(check_seed(&[1u8; 64]).is_ok());
    }

    #[test]
    fn test_check_index() {
        assert_eq!(check_index(HARDENED - 1, "index").unwrap(), HARDENED - 1);
        assert!(matches!(
            check_index(HARDENED, "index"),
            Err(HdKeyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        let secp = Secp256k1::new();
        let master = master_node(&test_seed(0x22)).unwrap();
        assert!(master.derive_path(&secp, &[]).is_err());
    }

    #[test]
    fn test_fingerprint_matches_bip32() {
        let secp = Secp256k1::new();
        let seed = test_seed(0x33);
        let master = master_node(&seed).unwrap();
        let xpriv = Xpriv::new_master(Network::Bitcoin, &seed).unwrap();

        let ours = fingerprint(&master.public_key.serialize());
        assert_eq!(ours.to_be_bytes(), xpriv.fingerprint(&secp).to_bytes());
    }

    #[test]
    fn test_dropped_node_is_zeroed() {
        let secp = Secp256k1::new();
        let master = master_node(&test_seed(0x77)).unwrap();
        let mut node = ManuallyDrop::new(master.ckd_priv(&secp, HARDENED).unwrap());

        let secret_ptr = node.secret.as_ptr();
        let chain_code_ptr = node.chain_code.0.as_ptr();
        assert!(read_raw(secret_ptr, 32).iter().any(|&b| b != 0));
        assert!(read_raw(chain_code_ptr, 32).iter().any(|&b| b != 0));

        // SAFETY: the node is only read as raw bytes after this
        unsafe { ManuallyDrop::drop(&mut node) };

        assert_eq!(node.secret.as_ptr(), secret_ptr);
        assert_eq!(node.chain_code.0.as_ptr(), chain_code_ptr);
        assert!(read_raw(node.secret.as_ptr(), 32).iter().all(|&b| b == 0));
        assert!(read_raw(node.chain_code.0.as_ptr(), 32).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_erase_clears_key_values() {
        let mut key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        erase(&mut key);
        assert_eq!(key.secret_bytes(), [0u8; 32]);

        let mut tweak = Scalar::from_be_bytes([0x07; 32]).unwrap();
        erase(&mut tweak);
        assert_eq!(tweak, Scalar::ZERO);
    }

    #[test]
    fn test_node_rejects_invalid_secret() {
        let secp = Secp256k1::new();
        assert!(PrivateNode::new(&secp, &[0u8; 32], &[1u8; 32], 0).is_err());
        assert!(PrivateNode::new(&secp, &[0xFF; 32], &[1u8; 32], 0).is_err());

        let node = PrivateNode::new(&secp, &[0x01; 32], &[0x02; 32], 4).unwrap();
        assert_eq!(node.secret(), &[0x01; 32]);
        assert_eq!(node.chain_code.0, [0x02; 32]);
        assert_eq!(node.depth, 4);
    }
}
