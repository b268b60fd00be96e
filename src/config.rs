//! Network, indexer and polling configuration

use crate::constants::{
    self, DEFAULT_INDEXER_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS,
};
use alloy::primitives::{Address, ChainId, B256};
use eyre::{Context, Result};
use std::time::Duration;

/// EAS schema uids used for each kind of write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaSet {
    /// Grant details, refreshed on updates
    pub grant_details: B256,
    /// Milestone attestations (created, and revoked on deletion)
    pub milestone: B256,
    /// Milestone completion attestations
    pub milestone_completed: B256,
}

/// Per-chain configuration: RPC endpoint, EAS contract and schemas
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chain_id: ChainId,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// EAS contract address
    pub eas: Address,
    pub schemas: SchemaSet,
}

impl NetworkConfig {
    /// Configuration for any chain with a known EAS deployment
    pub fn for_chain(chain_id: ChainId, rpc_url: impl Into<String>) -> Result<Self> {
        let eas = constants::eas_address(chain_id)
            .ok_or_else(|| eyre::eyre!("No EAS deployment known for chain {}", chain_id))?;

        Ok(Self {
            chain_id,
            rpc_url: rpc_url.into(),
            eas,
            schemas: SchemaSet::default(),
        })
    }

    /// Optimism mainnet on the public RPC
    pub fn optimism() -> Self {
        Self::preset(constants::OPTIMISM, "https://mainnet.optimism.io")
    }

    /// Arbitrum One on the public RPC
    pub fn arbitrum() -> Self {
        Self::preset(constants::ARBITRUM, "https://arb1.arbitrum.io/rpc")
    }

    /// Celo mainnet on the public RPC
    pub fn celo() -> Self {
        Self::preset(constants::CELO, "https://forno.celo.org")
    }

    /// Polygon PoS on the public RPC
    pub fn polygon() -> Self {
        Self::preset(constants::POLYGON, "https://polygon-rpc.com")
    }

    /// Base mainnet on the public RPC
    pub fn base() -> Self {
        Self::preset(constants::BASE, "https://mainnet.base.org")
    }

    /// Sepolia testnet on the public RPC
    pub fn sepolia() -> Self {
        Self::preset(constants::SEPOLIA, "https://rpc.sepolia.org")
    }

    /// Optimism Sepolia testnet on the public RPC
    pub fn optimism_sepolia() -> Self {
        Self::preset(constants::OPTIMISM_SEPOLIA, "https://sepolia.optimism.io")
    }

    fn preset(chain_id: ChainId, rpc_url: &str) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.to_string(),
            eas: constants::eas_address(chain_id).unwrap_or(Address::ZERO),
            schemas: SchemaSet::default(),
        }
    }

    /// All preset networks
    pub fn presets() -> Vec<Self> {
        vec![
            Self::optimism(),
            Self::arbitrum(),
            Self::celo(),
            Self::polygon(),
            Self::base(),
            Self::sepolia(),
            Self::optimism_sepolia(),
        ]
    }

    /// Use a custom RPC URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Set the EAS contract address
    pub fn with_eas(mut self, eas: Address) -> Self {
        self.eas = eas;
        self
    }

    /// Set the schema uids
    pub fn with_schemas(mut self, schemas: SchemaSet) -> Self {
        self.schemas = schemas;
        self
    }
}

/// Indexer service endpoint
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEXER_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl IndexerConfig {
    /// Use a custom indexer base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Attempt budget for confirmation polling
///
/// Timeouts are count based: the worst case wait is roughly
/// `max_attempts * interval`, plus query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum indexer queries per batch. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay between two queries
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Set the attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Everything needed to wire the SDK against real networks
#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub networks: Vec<NetworkConfig>,
    pub indexer: IndexerConfig,
    pub poll: PollPolicy,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            networks: NetworkConfig::presets(),
            indexer: IndexerConfig::default(),
            poll: PollPolicy::default(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from the environment (and a `.env` file, if present)
    ///
    /// Recognized variables:
    /// - `GAP_INDEXER_URL`
    /// - `POLL_MAX_ATTEMPTS`, `POLL_INTERVAL_MS`
    /// - `RPC_URL_<chain id>` overrides a preset's RPC endpoint
    /// - `SCHEMA_GRANT_DETAILS_<chain id>`, `SCHEMA_MILESTONE_<chain id>`,
    ///   `SCHEMA_MILESTONE_COMPLETED_<chain id>`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("GAP_INDEXER_URL") {
            config.indexer = config.indexer.with_base_url(url);
        }
        if let Ok(attempts) = std::env::var("POLL_MAX_ATTEMPTS") {
            let attempts = attempts
                .parse()
                .context("POLL_MAX_ATTEMPTS must be an unsigned integer")?;
            config.poll = config.poll.with_max_attempts(attempts);
        }
        if let Ok(interval) = std::env::var("POLL_INTERVAL_MS") {
            let interval = interval
                .parse()
                .context("POLL_INTERVAL_MS must be an unsigned integer")?;
            config.poll = config.poll.with_interval(Duration::from_millis(interval));
        }

        for network in &mut config.networks {
            let id = network.chain_id;
            if let Ok(url) = std::env::var(format!("RPC_URL_{}", id)) {
                network.rpc_url = url;
            }
            if let Some(uid) = env_b256(&format!("SCHEMA_GRANT_DETAILS_{}", id))? {
                network.schemas.grant_details = uid;
            }
            if let Some(uid) = env_b256(&format!("SCHEMA_MILESTONE_{}", id))? {
                network.schemas.milestone = uid;
            }
            if let Some(uid) = env_b256(&format!("SCHEMA_MILESTONE_COMPLETED_{}", id))? {
                network.schemas.milestone_completed = uid;
            }
        }

        Ok(config)
    }
}

fn env_b256(name: &str) -> Result<Option<B256>> {
    match std::env::var(name) {
        Ok(value) => {
            let uid = value
                .parse()
                .with_context(|| format!("{} must be a 32-byte hex value", name))?;
            Ok(Some(uid))
        }
        Err(_) => Ok(None),
    }
}
