//! Chain error types

use alloy_primitives::B256;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ChainError>;

/// ABI decoding failures.
///
/// These reject a single log or transaction, never a whole query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Call data is shorter than a function selector
    #[error("call data has {0} bytes, no function selector")]
    MissingSelector(usize),

    /// Event data, topics or call arguments do not match the ABI
    #[error("ABI decoding failed: {0}")]
    Abi(String),

    /// Log has fewer topics than the event layout requires
    #[error("expected {expected} topics, found {found}")]
    MissingTopics { expected: usize, found: usize },

    /// Log topic0 is not the expected event signature
    #[error("unexpected event signature {0}")]
    UnexpectedEvent(B256),

    /// Call data targets a different function
    #[error("unexpected function call {0}")]
    UnexpectedFunction(String),

    /// Decoded holder does not hash to the indexed topic
    #[error("decoded holder does not match indexed holder hash")]
    HolderHashMismatch,

    /// Log is pending or missing positional fields
    #[error("log is missing {0}")]
    Incomplete(&'static str),

    /// Log was removed by a chain reorganisation
    #[error("log was removed by a reorganisation")]
    Removed,
}

impl From<alloy_sol_types::Error> for DecodeError {
    fn from(err: alloy_sol_types::Error) -> Self {
        DecodeError::Abi(err.to_string())
    }
}

/// Chain RPC errors
#[derive(Debug, Error)]
pub enum ChainError {
    /// Endpoint unreachable or connection dropped
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success HTTP status
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Node returned a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// ABI decoding failed
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Request timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ChainError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChainError::Timeout(err.to_string())
        } else if err.is_decode() {
            ChainError::InvalidResponse(err.to_string())
        } else {
            ChainError::Transport(err.to_string())
        }
    }
}

impl From<vericred_core::Error> for ChainError {
    fn from(err: vericred_core::Error) -> Self {
        ChainError::Configuration(err.to_string())
    }
}
