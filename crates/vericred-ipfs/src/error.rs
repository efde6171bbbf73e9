//! IPFS error types

use thiserror::Error;

/// Metadata retrieval failures.
///
/// These never leave [`crate::GatewayFetcher::fetch`]; they are folded into
/// [`crate::MetadataOutcome`] and logged.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// URI is not a content address
    #[error("Invalid IPFS URI: {0}")]
    InvalidUri(String),

    /// Gateway unreachable or request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Gateway answered with a non-success status
    #[error("Failed to fetch from IPFS gateway: {status}")]
    Status { status: u16 },

    /// Body is not JSON
    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    /// Fetcher configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Pinning failures
#[derive(Debug, Error)]
pub enum PinningError {
    /// Credentials were not supplied
    #[error("Pinata API keys are not configured")]
    MissingCredentials,

    /// Service unreachable or request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("Failed to pin JSON to IPFS: {status} - {body}")]
    Status { status: String, body: String },

    /// Response did not have the expected shape
    #[error("Invalid pinning response: {0}")]
    InvalidResponse(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PinningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PinningError::InvalidResponse(err.to_string())
        } else {
            PinningError::Request(err.to_string())
        }
    }
}
