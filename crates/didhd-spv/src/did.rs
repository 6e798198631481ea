//! Decentralized identifiers backed by identity addresses
//!
//! `did:elastos:<address>`, where the method-specific id is the identity
//! address of the DID's key.

use didhd_core::{decode_address, encode_address, AddressKind, DerivedKeyPair, PUBLICKEY_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AdapterError, Result};

pub const METHOD: &str = "elastos";

const PREFIX: &str = "did:elastos:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method_specific_id: String,
}

impl Did {
    /// DID of a compressed public key.
    pub fn from_public_key(public_key: &[u8; PUBLICKEY_BYTES]) -> Result<Self> {
        Ok(Self {
            method_specific_id: encode_address(public_key)?,
        })
    }

    /// DID of a derived key pair. Fails if the pair has been wiped.
    pub fn from_key_pair(pair: &DerivedKeyPair) -> Result<Self> {
        Self::from_method_specific_id(pair.address())
    }

    /// Parse the address part alone.
    pub fn from_method_specific_id(id: &str) -> Result<Self> {
        let (kind, _) =
            decode_address(id).map_err(|e| AdapterError::InvalidDid(format!("{}: {}", id, e)))?;
        if kind != AddressKind::Identity {
            return Err(AdapterError::InvalidDid(format!(
                "{} is not an identity address",
                id
            )));
        }
        Ok(Self {
            method_specific_id: id.to_string(),
        })
    }

    pub fn method_specific_id(&self) -> &str {
        &self.method_specific_id
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.method_specific_id)
    }
}

impl FromStr for Did {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| AdapterError::InvalidDid(format!("expected {}<address>: {}", PREFIX, s)))?;
        Self::from_method_specific_id(id)
    }
}

impl TryFrom<String> for Did {
    type Error = AdapterError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}
