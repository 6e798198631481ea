//! Textual BIP-32 derivation paths
//!
//! Accepted forms: `m/44'/0'/0'/0/5`, `44H/0H/0H/0/5`, `44h/0h`. The `m`
//! prefix is optional; `m` or the empty string is the empty path. Hardened
//! components carry a `'`, `H` or `h` suffix.

use std::fmt;
use std::str::FromStr;

use crate::ckd::{self, HARDENED};
use crate::identity::{ACCOUNT, PURPOSE};
use crate::keys::KeyPath;
use crate::{HdKeyError, Result};

/// A sequence of raw BIP-32 child numbers (hardened bit included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(child_numbers: Vec<u32>) -> Self {
        Self(child_numbers)
    }

    /// The identity node path `m/44'/coin_type'/0'`.
    pub fn identity(coin_type: u32) -> Result<Self> {
        let coin_type = ckd::check_index(coin_type, "coin type")?;
        Ok(Self(vec![
            PURPOSE | HARDENED,
            coin_type | HARDENED,
            ACCOUNT | HARDENED,
        ]))
    }

    /// Append one step; `index` must not carry the hardened bit.
    pub fn child(mut self, index: u32, hardened: bool) -> Result<Self> {
        let index = ckd::check_index(index, "index")?;
        self.0.push(if hardened { index | HARDENED } else { index });
        Ok(self)
    }

    pub fn child_numbers(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any step needs the private key.
    pub fn has_hardened(&self) -> bool {
        self.0.iter().any(|&n| n >= HARDENED)
    }
}

impl From<KeyPath> for DerivationPath {
    fn from(path: KeyPath) -> Self {
        Self(path.child_numbers().to_vec())
    }
}

fn parse_component(component: &str) -> Result<u32> {
    let (digits, hardened) = match component.strip_suffix(|c: char| matches!(c, '\'' | 'H' | 'h')) {
        Some(digits) => (digits, true),
        None => (component, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HdKeyError::InvalidArgument(format!(
            "invalid path component: {:?}",
            component
        )));
    }

    let index: u32 = digits.parse().map_err(|_| {
        HdKeyError::InvalidArgument(format!("path component out of range: {}", component))
    })?;
    let index = ckd::check_index(index, "path component")?;
    Ok(if hardened { index | HARDENED } else { index })
}

impl FromStr for DerivationPath {
    type Err = HdKeyError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let body = match s {
            "" | "m" | "M" => return Ok(Self::default()),
            _ => s
                .strip_prefix("m/")
                .or_else(|| s.strip_prefix("M/"))
                .unwrap_or(s),
        };

        body.split('/')
            .map(parse_component)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &n in &self.0 {
            if n >= HARDENED {
                write!(f, "/{}'", n - HARDENED)?;
            } else {
                write!(f, "/{}", n)?;
            }
        }
        Ok(())
    }
}
