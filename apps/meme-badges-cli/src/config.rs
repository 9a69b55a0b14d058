use crate::error::{CliError, CliResult};
use meme_badges_chain::{GatewayConfig, PrivateKeySigner, ReaderConfig};
use meme_badges_engine::EngineConfig;
use meme_badges_types::{ether, Address, U256};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Overrides `minter_key_path` when set
pub const MINTER_KEY_ENV: &str = "MEME_BADGES_MINTER_KEY";

/// Service configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// JSON-RPC endpoint of the chain
    pub rpc_url: String,

    /// Token factory emitting `TokenCreated`
    pub factory_address: String,

    /// Badge NFT contract
    pub badge_nft_address: String,

    /// SQLite file holding the ledger and the mint queue
    pub database_path: PathBuf,

    /// File containing the hex-encoded minter private key
    pub minter_key_path: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub reader: ReaderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub sweep_interval_secs: u64,
    pub max_retries: u32,
    pub confirmation_timeout_secs: u64,
    pub retry_delay_secs: u64,
    pub read_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub max_submissions_per_sweep: usize,
    pub event_buffer: usize,
    pub threshold_cache_secs: u64,
    pub max_evaluation_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
            max_retries: defaults.max_retries,
            confirmation_timeout_secs: defaults.confirmation_timeout.as_secs(),
            retry_delay_secs: defaults.retry_delay.as_secs(),
            read_timeout_secs: defaults.read_timeout.as_secs(),
            submit_timeout_secs: defaults.submit_timeout.as_secs(),
            max_submissions_per_sweep: defaults.max_submissions_per_sweep,
            event_buffer: defaults.event_buffer,
            threshold_cache_secs: defaults.threshold_cache_ttl.as_secs(),
            max_evaluation_attempts: defaults.max_evaluation_attempts,
        }
    }
}

impl EngineSettings {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            max_submissions_per_sweep: self.max_submissions_per_sweep,
            event_buffer: self.event_buffer,
            threshold_cache_ttl: Duration::from_secs(self.threshold_cache_secs),
            max_evaluation_attempts: self.max_evaluation_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub poll_interval_secs: u64,
    pub max_block_range: u64,
    pub start_block: Option<u64>,
    /// Decimal wei amount; smaller transfers are ignored
    pub min_transfer_value_wei: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        let defaults = ReaderConfig::default();
        Self {
            poll_interval_secs: defaults.poll_interval.as_secs(),
            max_block_range: defaults.max_block_range,
            start_block: defaults.start_block,
            min_transfer_value_wei: ether(10).to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate everything that can be checked offline
    pub fn from_yaml(contents: &str) -> CliResult<Self> {
        let config: ServiceConfig = serde_yaml::from_str(contents)?;

        config.rpc_url()?;
        config.factory_address()?;
        config.badge_nft_address()?;
        config.min_transfer_value()?;

        if config.engine.max_retries == 0 {
            return Err(CliError::InvalidConfig(
                "engine.max_retries must be at least 1".to_string(),
            ));
        }
        if config.engine.max_evaluation_attempts == 0 {
            return Err(CliError::InvalidConfig(
                "engine.max_evaluation_attempts must be at least 1".to_string(),
            ));
        }
        if config.engine.sweep_interval_secs == 0 {
            return Err(CliError::InvalidConfig(
                "engine.sweep_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn rpc_url(&self) -> CliResult<Url> {
        Url::parse(&self.rpc_url)
            .map_err(|e| CliError::InvalidConfig(format!("Invalid rpc_url '{}': {}", self.rpc_url, e)))
    }

    pub fn factory_address(&self) -> CliResult<Address> {
        parse_contract_address("factory_address", &self.factory_address)
    }

    pub fn badge_nft_address(&self) -> CliResult<Address> {
        parse_contract_address("badge_nft_address", &self.badge_nft_address)
    }

    pub fn min_transfer_value(&self) -> CliResult<U256> {
        U256::from_str(self.reader.min_transfer_value_wei.trim()).map_err(|e| {
            CliError::InvalidConfig(format!(
                "Invalid reader.min_transfer_value_wei '{}': {}",
                self.reader.min_transfer_value_wei, e
            ))
        })
    }

    pub fn gateway_config(&self) -> CliResult<GatewayConfig> {
        let mut config = GatewayConfig::new(self.factory_address()?, self.badge_nft_address()?);
        config.min_transfer_value = self.min_transfer_value()?;
        Ok(config)
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            poll_interval: Duration::from_secs(self.reader.poll_interval_secs),
            max_block_range: self.reader.max_block_range,
            start_block: self.reader.start_block,
            ..Default::default()
        }
    }

    /// Minter key from the environment, falling back to `minter_key_path`
    pub fn load_minter_key(&self) -> CliResult<PrivateKeySigner> {
        let from_env = std::env::var(MINTER_KEY_ENV).ok().filter(|k| !k.trim().is_empty());

        let key = match (from_env, &self.minter_key_path) {
            (Some(key), _) => key,
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                CliError::InvalidConfig(format!(
                    "Failed to read minter key from {}: {}",
                    path.display(),
                    e
                ))
            })?,
            (None, None) => {
                return Err(CliError::InvalidConfig(format!(
                    "No minter key: set {} or minter_key_path",
                    MINTER_KEY_ENV
                )))
            }
        };

        parse_minter_key(&key)
    }
}

pub fn parse_minter_key(key: &str) -> CliResult<PrivateKeySigner> {
    PrivateKeySigner::from_str(key.trim())
        .map_err(|e| CliError::InvalidConfig(format!("Invalid minter key: {}", e)))
}

pub fn parse_address(value: &str) -> CliResult<Address> {
    Address::from_str(value.trim())
        .map_err(|e| CliError::InvalidAddress(format!("'{}': {}", value, e)))
}

fn parse_contract_address(field: &str, value: &str) -> CliResult<Address> {
    let address = parse_address(value)
        .map_err(|e| CliError::InvalidConfig(format!("Invalid {}: {}", field, e)))?;
    if address.is_zero() {
        return Err(CliError::InvalidConfig(format!(
            "{} must not be the zero address",
            field
        )));
    }
    Ok(address)
}
