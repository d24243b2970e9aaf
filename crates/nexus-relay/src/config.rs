//! # Relay Configuration
//!
//! TOML configuration for the registry and per-chain verifier tuning.
//!
//! ```toml
//! nexus_url = "http://127.0.0.1:7000"
//! registration = "reject"
//!
//! [[chains]]
//! app_id = "zksync-era"
//! kind = "zk-rollup-l2"
//! rpc_endpoint = "http://127.0.0.1:3050"
//! mailbox_contract = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
//! state_manager_contract = "0x5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b"
//! native_chain_id = "270"
//! block_query_offset = 150
//! ```

use crate::application::{ChainRegistry, VerifierOptions};
use crate::domain::hex::parse_address;
use crate::domain::{Address, ChainEntry, ChainKind, RegistrationPolicy};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding `nexus_url`.
pub const NEXUS_URL_ENV: &str = "RELAY_NEXUS_URL";

/// Aggregation endpoint used when none is configured.
pub const DEFAULT_NEXUS_URL: &str = "http://127.0.0.1:7000";

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parse error.
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// Parsed but unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One `[[chains]]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct ChainConfig {
    /// Registry key.
    pub app_id: String,
    /// Chain kind tag.
    pub kind: ChainKind,
    /// JSON-RPC endpoint.
    pub rpc_endpoint: String,
    /// Mailbox contract address.
    #[serde(default)]
    pub mailbox_contract: Option<String>,
    /// State-manager contract address.
    #[serde(default)]
    pub state_manager_contract: Option<String>,
    /// Native chain id.
    pub native_chain_id: String,
    /// Verification-lag override.
    #[serde(default)]
    pub block_query_offset: Option<u64>,
    /// Messages mapping slot override.
    #[serde(default)]
    pub mapping_slot: Option<u64>,
}

impl ChainConfig {
    fn address(&self, field: &str, value: &Option<String>) -> Result<Option<Address>, ConfigError> {
        value
            .as_deref()
            .map(|s| {
                parse_address(s).map_err(|e| {
                    ConfigError::Invalid(format!("{}.{}: {}", self.app_id, field, e))
                })
            })
            .transpose()
    }

    /// Registry entry for this chain.
    pub fn to_entry(&self) -> Result<ChainEntry, ConfigError> {
        Ok(ChainEntry {
            app_id: self.app_id.clone(),
            kind: self.kind,
            rpc_endpoint: self.rpc_endpoint.clone(),
            mailbox_contract: self.address("mailbox_contract", &self.mailbox_contract)?,
            state_manager_contract: self
                .address("state_manager_contract", &self.state_manager_contract)?,
            native_chain_id: self.native_chain_id.clone(),
        })
    }

    /// Verifier options, kind defaults filled in.
    pub fn verifier_options(&self) -> VerifierOptions {
        let defaults = VerifierOptions::for_kind(self.kind);
        VerifierOptions {
            block_query_offset: self
                .block_query_offset
                .unwrap_or(defaults.block_query_offset),
            mapping_slot: self.mapping_slot.unwrap_or(defaults.mapping_slot),
        }
    }
}

/// Top-level relay configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct RelayConfig {
    /// Nexus aggregation service base URL.
    #[serde(default = "default_nexus_url")]
    pub nexus_url: String,
    /// Re-registration policy.
    #[serde(default)]
    pub registration: RegistrationPolicy,
    /// Registered chains.
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

fn default_nexus_url() -> String {
    DEFAULT_NEXUS_URL.to_string()
}

impl RelayConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        let mut config = Self::parse(&content)?;
        config.apply_overrides(std::env::var(NEXUS_URL_ENV).ok());
        Ok(config)
    }

    /// Parse from a TOML string and validate every chain entry.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        for chain in &config.chains {
            chain.to_entry()?;
        }
        Ok(config)
    }

    /// Replace `nexus_url` if an override is present and non-empty.
    pub fn apply_overrides(&mut self, nexus_url: Option<String>) {
        if let Some(url) = nexus_url.filter(|u| !u.trim().is_empty()) {
            self.nexus_url = url;
        }
    }

    /// Registry holding every configured chain.
    pub fn build_registry(&self) -> Result<ChainRegistry, ConfigError> {
        let registry = ChainRegistry::with_policy(self.registration);
        for chain in &self.chains {
            registry
                .add_chain(chain.to_entry()?)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(registry)
    }

    /// Configured chain for `app_id`.
    pub fn chain(&self, app_id: &str) -> Result<&ChainConfig, ConfigError> {
        self.chains
            .iter()
            .find(|c| c.app_id == app_id)
            .ok_or_else(|| ConfigError::Invalid(format!("no chain configured for {}", app_id)))
    }

    /// Verifier options for `app_id`.
    pub fn verifier_options(&self, app_id: &str) -> Result<VerifierOptions, ConfigError> {
        Ok(self.chain(app_id)?.verifier_options())
    }
}
