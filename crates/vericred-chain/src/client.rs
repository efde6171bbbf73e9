//! Chain client abstraction

use alloy_primitives::{Address, Bytes, B256};
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter};
use async_trait::async_trait;
use std::fmt;

use vericred_core::{BlockTag, LogPosition, TxHash};

use crate::error::Result;

pub use alloy_rpc_types_eth::Log;

/// Position of a log, if it has been mined
pub fn log_position(log: &Log) -> Option<LogPosition> {
    match (log.block_number, log.log_index) {
        (Some(block), Some(index)) => Some(LogPosition::new(block, index)),
        _ => None,
    }
}

/// Filter for a single event type emitted by one contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract
    pub address: Address,
    /// Event signature hash
    pub topic0: B256,
    /// First block, inclusive
    pub from_block: BlockTag,
    /// Last block, inclusive
    pub to_block: BlockTag,
}

impl LogFilter {
    /// Filter over the full history of a contract
    pub fn new(address: Address, topic0: B256) -> Self {
        Self {
            address,
            topic0,
            from_block: BlockTag::Earliest,
            to_block: BlockTag::Latest,
        }
    }

    /// Restrict the block range
    pub fn with_range(mut self, from_block: BlockTag, to_block: BlockTag) -> Self {
        self.from_block = from_block;
        self.to_block = to_block;
        self
    }
}

impl From<&LogFilter> for Filter {
    fn from(filter: &LogFilter) -> Self {
        Filter::new()
            .address(filter.address)
            .event_signature(filter.topic0)
            .from_block(block_number_or_tag(filter.from_block))
            .to_block(block_number_or_tag(filter.to_block))
    }
}

/// JSON-RPC block parameter for a block tag
pub fn block_number_or_tag(tag: BlockTag) -> BlockNumberOrTag {
    match tag {
        BlockTag::Earliest => BlockNumberOrTag::Earliest,
        BlockTag::Latest => BlockNumberOrTag::Latest,
        BlockTag::Number(n) => BlockNumberOrTag::Number(n),
    }
}

/// Block selector for header lookups
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockId {
    /// By hash
    Hash(B256),
    /// By number
    Number(u64),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => write!(f, "{}", hash),
            Self::Number(n) => write!(f, "#{}", n),
        }
    }
}

/// Subset of a block header needed for timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block number
    pub number: u64,
    /// Block hash
    pub hash: Option<B256>,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

/// Subset of a transaction needed to recover call arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction hash
    pub hash: TxHash,
    /// Sender
    pub from: Address,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Call data
    pub input: Bytes,
}

/// Read-only chain access.
///
/// Implemented over JSON-RPC by [`crate::JsonRpcClient`]; tests supply
/// in-memory implementations.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Latest block number
    async fn block_number(&self) -> Result<u64>;

    /// Logs matching a filter
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>>;

    /// Block header, `None` when the node does not know the block
    async fn get_block(&self, id: BlockId) -> Result<Option<BlockHeader>>;

    /// Transaction, `None` when the node does not know it
    async fn get_transaction(&self, hash: TxHash) -> Result<Option<Transaction>>;

    /// Execute a read-only contract call against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}
