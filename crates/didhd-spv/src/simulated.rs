//! In-memory ID chain
//!
//! Accepts ID transactions immediately and resolves them in the JSON-RPC
//! response shape of a resolver. Nothing is persisted.
//!
//! A payload is a JSON object naming the DID and the operation:
//!
//! ```json
//! {"did": "did:elastos:i...", "operation": "create", ...}
//! ```
//!
//! Any further fields are kept verbatim in the transaction record.

use bitcoin::hashes::{sha256d, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::config::{AdapterConfig, Network};
use crate::did::Did;
use crate::{AdapterError, DidAdapter, Result};

/// ID transaction operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdOperation {
    Create,
    Update,
    Transfer,
    Deactivate,
}

/// State of a DID on the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStatus {
    Valid,
    Deactivated,
    NotFound,
}

/// One accepted ID transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    /// Position in the chain's global order, starting at 1
    pub sequence: u64,
    pub operation: IdOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub payload: serde_json::Value,
}

/// The `result` member of a resolve response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub did: Did,
    pub status: ResolveStatus,
    /// Newest first
    #[serde(default)]
    pub transaction: Vec<TransactionRecord>,
}

#[derive(Serialize)]
struct ResolveResponse<'a> {
    jsonrpc: &'static str,
    id: u64,
    result: &'a ResolveResult,
}

#[derive(Deserialize)]
struct PayloadHeader {
    did: String,
    operation: IdOperation,
}

#[derive(Default)]
struct ChainState {
    /// Oldest first
    transactions: HashMap<Did, Vec<TransactionRecord>>,
    height: u64,
    requests: u64,
}

/// In-memory [`DidAdapter`]
pub struct SimulatedIdChain {
    network: Network,
    available: AtomicBool,
    state: Mutex<ChainState>,
}

impl Default for SimulatedIdChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedIdChain {
    /// An empty, available mainnet chain.
    pub fn new() -> Self {
        Self {
            network: Network::MainNet,
            available: AtomicBool::new(true),
            state: Mutex::new(ChainState::default()),
        }
    }

    /// An empty chain for the configured network.
    pub fn open(config: &AdapterConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Opened simulated ID chain on {} for wallet {}",
            config.network,
            config.wallet_id
        );
        Ok(Self {
            network: config.network,
            ..Self::new()
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Simulate the wallet losing or regaining sync.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of accepted transactions.
    pub fn height(&self) -> Result<u64> {
        Ok(self.lock()?.height)
    }

    /// Resolve into the typed result.
    pub fn resolve_result(&self, did: &Did, all: bool) -> Result<ResolveResult> {
        let state = self.lock()?;
        Ok(Self::result_for(&state, did, all))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChainState>> {
        self.state
            .lock()
            .map_err(|_| AdapterError::Unavailable("chain state poisoned".into()))
    }

    fn result_for(state: &ChainState, did: &Did, all: bool) -> ResolveResult {
        let records = match state.transactions.get(did) {
            Some(records) if !records.is_empty() => records,
            _ => {
                return ResolveResult {
                    did: did.clone(),
                    status: ResolveStatus::NotFound,
                    transaction: Vec::new(),
                }
            }
        };

        let status = match records.last().map(|r| r.operation) {
            Some(IdOperation::Deactivate) => ResolveStatus::Deactivated,
            _ => ResolveStatus::Valid,
        };
        let take = if all { records.len() } else { 1 };

        ResolveResult {
            did: did.clone(),
            status,
            transaction: records.iter().rev().take(take).cloned().collect(),
        }
    }

    fn check_operation(existing: Option<&Vec<TransactionRecord>>, operation: IdOperation) -> Result<()> {
        let last = existing.and_then(|records| records.last()).map(|r| r.operation);
        match (last, operation) {
            (Some(IdOperation::Deactivate), _) => {
                Err(AdapterError::InvalidPayload("DID is deactivated".into()))
            }
            (None, IdOperation::Create) => Ok(()),
            (None, _) => Err(AdapterError::InvalidPayload(
                "DID must be created before it can be changed".into(),
            )),
            (Some(_), IdOperation::Create) => {
                Err(AdapterError::InvalidPayload("DID already exists".into()))
            }
            (Some(_), _) => Ok(()),
        }
    }
}

/// Hex double-SHA-256 of the payload bytes
fn transaction_id(payload: &str) -> String {
    hex::encode(sha256d::Hash::hash(payload.as_bytes()).to_byte_array())
}

impl DidAdapter for SimulatedIdChain {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn create_id_transaction(
        &self,
        payload: &str,
        memo: Option<&str>,
        password: &str,
    ) -> Result<String> {
        if !self.is_available() {
            return Err(AdapterError::Unavailable("wallet is not synchronized".into()));
        }
        if password.is_empty() {
            return Err(AdapterError::Unauthorized("wallet password required".into()));
        }

        let value: serde_json::Value = serde_json::from_str(payload)?;
        let header: PayloadHeader = serde_json::from_value(value.clone())
            .map_err(|e| AdapterError::InvalidPayload(e.to_string()))?;
        let did: Did = header.did.parse()?;

        let mut state = self.lock()?;
        Self::check_operation(state.transactions.get(&did), header.operation)?;

        let txid = transaction_id(payload);
        state.height += 1;
        let record = TransactionRecord {
            txid: txid.clone(),
            sequence: state.height,
            operation: header.operation,
            memo: memo.map(str::to_string),
            payload: value,
        };
        state.transactions.entry(did.clone()).or_default().push(record);

        log::debug!("Accepted {:?} for {} at height {}", header.operation, did, state.height);
        Ok(txid)
    }

    fn resolve(&self, did: &str, all: bool) -> Result<String> {
        let did: Did = did.parse()?;
        let mut state = self.lock()?;
        state.requests += 1;

        let result = Self::result_for(&state, &did, all);
        let response = ResolveResponse {
            jsonrpc: "2.0",
            id: state.requests,
            result: &result,
        };
        Ok(serde_json::to_string(&response)?)
    }
}
