//! Secure random sources for mnemonic generation
//!
//! Generation never reaches for a global RNG: callers pass an
//! [`EntropySource`], and every implementation here is safe to share
//! across threads.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::{HdKeyError, Result};

/// A thread-safe source of random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` completely or fail without partial output being used.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG (getrandom).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| HdKeyError::EntropyUnavailable(e.to_string()))
    }
}

/// Deterministic generator for reproducible tests and tooling.
///
/// Never use this for real wallets: anyone holding the 32-byte seed can
/// reproduce every mnemonic it produces.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| HdKeyError::EntropyUnavailable("seeded generator poisoned".into()))?;
        rng.fill_bytes(dest);
        Ok(())
    }
}

impl std::fmt::Debug for SeededEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededEntropy").finish_non_exhaustive()
    }
}
