//! Indexer error types

use thiserror::Error;
use vericred_chain::ChainError;
use vericred_ipfs::PinningError;

/// Result type alias
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Failures that abort a whole query.
///
/// Per-certificate problems never show up here; they degrade the affected
/// record or skip it.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Certificate log query failed
    #[error("Failed to fetch certificate logs from blockchain: {0}")]
    CertificateLogs(#[source] ChainError),

    /// Issuer log query failed
    #[error("Failed to fetch issuer logs from blockchain: {0}")]
    IssuerLogs(#[source] ChainError),

    /// Contract view call failed
    #[error("Failed to read contract state: {0}")]
    Contract(#[source] ChainError),

    /// Pinning failed
    #[error(transparent)]
    Pinning(#[from] PinningError),

    /// Required configuration is missing
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IndexerError {
    /// Whether the failure needs operator action rather than a retry
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Pinning(PinningError::MissingCredentials)
        )
    }
}

impl From<vericred_core::Error> for IndexerError {
    fn from(err: vericred_core::Error) -> Self {
        match err {
            vericred_core::Error::Configuration(msg) => IndexerError::Configuration(msg),
        }
    }
}
