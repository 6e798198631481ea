//! Adapter configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{AdapterError, Result};

const MAINNET_ENDPOINTS: &[&str] = &["https://api.elastos.io/eid", "https://api.trinity-tech.io/eid"];

const TESTNET_ENDPOINTS: &[&str] = &[
    "https://api-testnet.elastos.io/eid",
    "https://api-testnet.trinity-tech.io/eid",
];

/// ID chain network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    MainNet,
    TestNet,
}

impl Network {
    /// Public resolver endpoints, preferred first.
    pub fn endpoints(self) -> &'static [&'static str] {
        match self {
            Self::MainNet => MAINNET_ENDPOINTS,
            Self::TestNet => TESTNET_ENDPOINTS,
        }
    }

    pub fn default_resolver(self) -> &'static str {
        self.endpoints()[0]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet",
            Self::TestNet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::MainNet),
            "testnet" => Ok(Self::TestNet),
            other => Err(AdapterError::InvalidConfig(format!(
                "unknown network: {}",
                other
            ))),
        }
    }
}

/// Everything needed to open a wallet-backed adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Directory holding the SPV wallet's data
    pub wallet_dir: PathBuf,
    /// Wallet to sign ID transactions with
    pub wallet_id: String,
    pub network: Network,
    /// Resolver URL used for DID resolution
    pub resolver: String,
}

impl AdapterConfig {
    /// Configuration using the network's preferred resolver.
    pub fn new(wallet_dir: impl Into<PathBuf>, wallet_id: impl Into<String>, network: Network) -> Self {
        Self {
            wallet_dir: wallet_dir.into(),
            wallet_id: wallet_id.into(),
            network,
            resolver: network.default_resolver().to_string(),
        }
    }

    /// Check the fields an adapter needs before opening a wallet.
    pub fn validate(&self) -> Result<()> {
        if self.wallet_id.is_empty() {
            return Err(AdapterError::InvalidConfig("wallet id must not be empty".into()));
        }
        if self.wallet_dir.as_os_str().is_empty() {
            return Err(AdapterError::InvalidConfig("wallet directory must not be empty".into()));
        }
        if !self.resolver.starts_with("http://") && !self.resolver.starts_with("https://") {
            return Err(AdapterError::InvalidConfig(format!(
                "resolver must be an http(s) URL: {}",
                self.resolver
            )));
        }
        Ok(())
    }
}
