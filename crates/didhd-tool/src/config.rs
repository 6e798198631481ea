//! Tool configuration, parsed from an optional TOML file plus environment
//! variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use didhd_core::{Language, WordCount};
use didhd_spv::Network;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Key generation and derivation defaults
    #[serde(default)]
    pub keys: KeysSection,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSection,

    /// ID chain adapter settings
    #[serde(default)]
    pub adapter: AdapterSection,
}

/// Key generation and derivation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysSection {
    /// Mnemonic language (english, french, spanish, japanese,
    /// chinese_simplified, chinese_traditional)
    #[serde(default = "default_language")]
    pub language: String,

    /// Words per generated mnemonic (12, 15, 18, 21 or 24)
    #[serde(default = "default_word_count")]
    pub word_count: usize,

    /// BIP-44 coin type
    #[serde(default)]
    pub coin_type: u32,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            language: default_language(),
            word_count: default_word_count(),
            coin_type: 0,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// ID chain adapter settings
///
/// `derive` reports the network and resolver its DIDs resolve through. The
/// wallet directory and id are only validated; no command opens a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterSection {
    /// "mainnet" or "testnet"
    #[serde(default = "default_network")]
    pub network: String,

    /// Resolver URL; the network's default when unset
    pub resolver: Option<String>,

    /// SPV wallet data directory
    #[serde(default = "default_wallet_dir")]
    pub wallet_dir: PathBuf,

    #[serde(default = "default_wallet_id")]
    pub wallet_id: String,
}

impl Default for AdapterSection {
    fn default() -> Self {
        Self {
            network: default_network(),
            resolver: None,
            wallet_dir: default_wallet_dir(),
            wallet_id: default_wallet_id(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_language() -> String {
    "english".to_string()
}

fn default_word_count() -> usize {
    12
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_wallet_dir() -> PathBuf {
    PathBuf::from(".didhd")
}

fn default_wallet_id() -> String {
    "default".to_string()
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ============================================================================
// Loading & environment override
// ============================================================================

impl ToolConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ToolConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DIDHD_LANGUAGE`
    /// - `DIDHD_COIN_TYPE`
    /// - `DIDHD_WORD_COUNT`
    /// - `DIDHD_LOG_LEVEL`
    /// - `DIDHD_NETWORK`
    /// - `DIDHD_RESOLVER`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("DIDHD_LANGUAGE") {
            self.keys.language = v;
        }
        if let Ok(v) = std::env::var("DIDHD_COIN_TYPE") {
            self.keys.coin_type = v
                .parse()
                .with_context(|| format!("DIDHD_COIN_TYPE is not a number: {}", v))?;
        }
        if let Ok(v) = std::env::var("DIDHD_WORD_COUNT") {
            self.keys.word_count = v
                .parse()
                .with_context(|| format!("DIDHD_WORD_COUNT is not a number: {}", v))?;
        }
        if let Ok(v) = std::env::var("DIDHD_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("DIDHD_NETWORK") {
            self.adapter.network = v;
        }
        if let Ok(v) = std::env::var("DIDHD_RESOLVER") {
            self.adapter.resolver = Some(v);
        }
        Ok(())
    }

    pub fn language(&self) -> Result<Language> {
        self.keys
            .language
            .parse()
            .with_context(|| format!("keys.language: {}", self.keys.language))
    }

    pub fn word_count(&self) -> Result<WordCount> {
        WordCount::from_words(self.keys.word_count)
            .with_context(|| format!("keys.word_count: {}", self.keys.word_count))
    }

    pub fn network(&self) -> Result<Network> {
        self.adapter
            .network
            .parse()
            .with_context(|| format!("adapter.network: {}", self.adapter.network))
    }

    /// Adapter configuration for the configured network.
    pub fn adapter_config(&self) -> Result<didhd_spv::AdapterConfig> {
        let mut config = didhd_spv::AdapterConfig::new(
            self.adapter.wallet_dir.clone(),
            self.adapter.wallet_id.clone(),
            self.network()?,
        );
        if let Some(ref resolver) = self.adapter.resolver {
            config.resolver = resolver.clone();
        }
        Ok(config)
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        self.language()?;
        self.word_count()?;

        anyhow::ensure!(
            self.keys.coin_type < 0x8000_0000,
            "keys.coin_type must be below 2^31"
        );

        anyhow::ensure!(
            LOG_LEVELS.contains(&self.logging.level.as_str()),
            "logging.level must be one of {}",
            LOG_LEVELS.join(", ")
        );

        self.adapter_config()?
            .validate()
            .context("adapter section is invalid")?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
