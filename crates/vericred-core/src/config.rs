//! Indexer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Address, BlockTag};

/// Public Sepolia endpoint used when no RPC URL is configured
pub const DEFAULT_RPC_URL: &str = "https://eth-sepolia.g.alchemy.com/v2/demo";

/// Gateway used to resolve `ipfs://` URIs
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs/";

/// Pinning endpoint for JSON documents
pub const DEFAULT_PINNING_URL: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";

/// Number of recent blocks scanned for issuer events
pub const DEFAULT_ISSUER_WINDOW_BLOCKS: u64 = 100_000;

/// Top-level configuration shared by the service and the CLI
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Chain RPC settings
    pub chain: ChainConfig,
    /// Certificate reconstruction settings
    pub reconstruction: ReconstructionConfig,
    /// Issuer reconstruction settings
    pub issuers: IssuerConfig,
    /// Metadata gateway and pinning settings
    pub ipfs: IpfsConfig,
}

impl IndexerConfig {
    /// Validate every section
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.chain.validate()?;
        self.reconstruction.validate()?;
        self.ipfs.validate()?;
        Ok(())
    }
}

/// How the holder identifier of a certificate event is recovered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderEncoding {
    /// `holderId` is emitted as plain event data
    #[default]
    EventData,
    /// `holderId` is an indexed topic; the plain value is decoded from the
    /// issuing transaction's call data
    TransactionInput,
}

/// Chain RPC configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Deployed certificate contract
    pub contract_address: Option<Address>,
    /// Event layout of the deployed contract
    pub holder_encoding: HolderEncoding,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retry configuration for transport failures
    pub retry: RetryConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            holder_encoding: HolderEncoding::default(),
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Contract address, failing when it has not been configured
    pub fn contract_address(&self) -> Result<Address> {
        self.contract_address.ok_or_else(|| {
            Error::Configuration("certificate contract address is not configured".to_string())
        })
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.rpc_url.trim().is_empty() {
            return Err("rpc_url must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retries
    pub max_retries: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate delay for attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay)
    }
}

/// Certificate reconstruction configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// First block scanned for certificate events
    pub from_block: BlockTag,
    /// Last block scanned for certificate events
    pub to_block: BlockTag,
    /// Timeout for each transaction, block and metadata fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Maximum certificates resolved concurrently
    pub max_concurrent_fetches: usize,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            from_block: BlockTag::Earliest,
            to_block: BlockTag::Latest,
            fetch_timeout_ms: 10_000,
            max_concurrent_fetches: 16,
        }
    }
}

impl ReconstructionConfig {
    /// Get per-fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.fetch_timeout_ms == 0 {
            return Err("fetch_timeout_ms must be > 0".to_string());
        }
        if self.max_concurrent_fetches == 0 {
            return Err("max_concurrent_fetches must be > 0".to_string());
        }
        if let (BlockTag::Number(from), BlockTag::Number(to)) = (self.from_block, self.to_block) {
            if from > to {
                return Err(format!("from_block {} is after to_block {}", from, to));
            }
        }
        Ok(())
    }
}

/// Issuer reconstruction configuration.
///
/// With a non-zero window, only the most recent `window_blocks` blocks are
/// scanned. Membership changes before the window are invisible: an issuer
/// added earlier and never touched since is not reported at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Recent-block window, `0` scans full history
    pub window_blocks: u64,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            window_blocks: DEFAULT_ISSUER_WINDOW_BLOCKS,
        }
    }
}

impl IssuerConfig {
    /// Scan the whole chain history
    pub fn full_history() -> Self {
        Self { window_blocks: 0 }
    }

    /// Effective window, `None` for full history
    pub fn window(&self) -> Option<u64> {
        (self.window_blocks > 0).then_some(self.window_blocks)
    }
}

/// Credentials for the pinning service
#[derive(Clone, Serialize, Deserialize)]
pub struct PinningCredentials {
    /// API key
    pub api_key: String,
    /// Secret API key
    pub secret_api_key: String,
}

impl PinningCredentials {
    /// Build credentials when both values are present and non-empty
    pub fn from_parts(api_key: Option<String>, secret_api_key: Option<String>) -> Option<Self> {
        match (api_key, secret_api_key) {
            (Some(api_key), Some(secret_api_key))
                if !api_key.trim().is_empty() && !secret_api_key.trim().is_empty() =>
            {
                Some(Self {
                    api_key,
                    secret_api_key,
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for PinningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinningCredentials")
            .field("api_key", &"<redacted>")
            .field("secret_api_key", &"<redacted>")
            .finish()
    }
}

/// Metadata gateway and pinning configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Gateway base URL; the CID is appended
    pub gateway_url: String,
    /// Pinning endpoint
    pub pinning_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Pinning credentials, supplied out-of-band
    #[serde(skip_serializing)]
    pub credentials: Option<PinningCredentials>,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            pinning_url: DEFAULT_PINNING_URL.to_string(),
            request_timeout_secs: 30,
            credentials: None,
        }
    }
}

impl IpfsConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.gateway_url.trim().is_empty() {
            return Err("gateway_url must not be empty".to_string());
        }
        if self.pinning_url.trim().is_empty() {
            return Err("pinning_url must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}
