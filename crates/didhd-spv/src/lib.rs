//! didhd SPV adapter
//!
//! The boundary between an SPV wallet and a DID resolution layer.
//!
//! A wallet publishes ID transactions and resolves DIDs through the
//! [`DidAdapter`] trait. Networking and chain synchronization live behind
//! the trait; this crate ships only the contract, its configuration and
//! [`SimulatedIdChain`], an in-memory implementation for tests and demos.
//!
//! # Example
//!
//! ```
//! use didhd_core::{derive_key_pair, MasterIdentity};
//! use didhd_spv::{DidAdapter, Did, SimulatedIdChain};
//!
//! let identity = MasterIdentity::from_seed(&[7u8; 64], 0).unwrap();
//! let pair = derive_key_pair(&identity, 0, 0, 0).unwrap();
//! let did = Did::from_key_pair(&pair).unwrap();
//!
//! let chain = SimulatedIdChain::new();
//! let payload = format!(r#"{{"did":"{}","operation":"create"}}"#, did);
//! let txid = chain.create_id_transaction(&payload, None, "secret").unwrap();
//!
//! let resolved = chain.resolve(&did.to_string(), false).unwrap();
//! assert!(resolved.contains(&txid));
//! ```

pub mod config;
pub mod did;
pub mod simulated;

pub use config::{AdapterConfig, Network};
pub use did::Did;
pub use simulated::{IdOperation, ResolveResult, ResolveStatus, SimulatedIdChain, TransactionRecord};

use didhd_core::HdKeyError;
use thiserror::Error;

/// Errors from DID adapter operations
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    #[error("Invalid ID transaction payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid adapter configuration: {0}")]
    InvalidConfig(String),

    #[error("Adapter unavailable: {0}")]
    Unavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Key error: {0}")]
    Key(#[from] HdKeyError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

/// Wallet-side services a DID layer needs from the chain.
///
/// Implementations must be shareable across threads; methods take `&self`.
pub trait DidAdapter: Send + Sync {
    /// Whether the wallet is synchronized and can publish transactions.
    fn is_available(&self) -> bool;

    /// Sign and publish an ID transaction carrying `payload`.
    ///
    /// `password` unlocks the wallet's signing key. Returns the transaction id.
    fn create_id_transaction(
        &self,
        payload: &str,
        memo: Option<&str>,
        password: &str,
    ) -> Result<String>;

    /// Resolve `did` to a JSON document listing its ID transactions.
    ///
    /// With `all` set, every transaction is listed, newest first; otherwise
    /// only the latest.
    fn resolve(&self, did: &str, all: bool) -> Result<String>;
}
