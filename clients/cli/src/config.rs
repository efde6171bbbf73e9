//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use vericred_core::{ChainConfig, IndexerConfig, IpfsConfig, IssuerConfig, ReconstructionConfig};

/// CLI configuration, stored as TOML.
///
/// Pinning credentials are never written here; they come from the
/// environment or the command line.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Print JSON instead of formatted text
    pub json_output: bool,
    /// Chain RPC settings
    pub chain: ChainConfig,
    /// Certificate reconstruction settings
    pub reconstruction: ReconstructionConfig,
    /// Issuer reconstruction settings
    pub issuers: IssuerConfig,
    /// Metadata gateway and pinning settings
    pub ipfs: IpfsConfig,
}

impl CliConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vericred")
            .join("config.toml")
    }

    /// Load config from file or create default
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Indexer configuration built from this file
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            chain: self.chain.clone(),
            reconstruction: self.reconstruction.clone(),
            issuers: self.issuers.clone(),
            ipfs: self.ipfs.clone(),
        }
    }
}
