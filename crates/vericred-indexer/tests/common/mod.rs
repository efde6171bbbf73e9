//! Shared test doubles for indexer tests

#![allow(dead_code)]

use alloy_primitives::{keccak256, Address, Bytes, LogData, B256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use vericred_chain::ICertificateRegistry::{
    isIssuerCall, ownerCall, CertificateIssued, CertificateRevoked, IssuerAdded, IssuerRemoved,
};
use vericred_chain::ICertificateRegistryHashed;
use vericred_chain::{BlockHeader, BlockId, ChainClient, ChainError, Log, LogFilter, Transaction};
use vericred_core::{BlockTag, HolderEncoding, IndexerConfig, TxHash};
use vericred_indexer::CertificateQuery;
use vericred_ipfs::{
    CertificateFields, MetadataFetcher, MetadataOutcome, PinReceipt, PinningError, PinningService,
};

pub const CONTRACT: Address = Address::repeat_byte(0xcc);
pub const OWNER: Address = Address::repeat_byte(0x01);
pub const ISSUER: Address = Address::repeat_byte(0x11);

/// Base timestamp of block 0
pub const GENESIS_TIME: u64 = 1_700_000_000;

pub fn tx_hash(block: u64, index: u64) -> TxHash {
    B256::left_padding_from(&(block * 1_000 + index).to_be_bytes())
}

pub fn block_hash(block: u64) -> B256 {
    B256::left_padding_from(&block.to_be_bytes())
}

fn mined(data: LogData, block: u64, index: u64) -> Log {
    Log {
        inner: alloy_primitives::Log {
            address: CONTRACT,
            data,
        },
        block_hash: Some(block_hash(block)),
        block_number: Some(block),
        block_timestamp: None,
        transaction_hash: Some(tx_hash(block, index)),
        transaction_index: Some(index),
        log_index: Some(index),
        removed: false,
    }
}

/// `CertificateIssued` with the holder in event data
pub fn issued_log(block: u64, index: u64, holder: &str, uri: &str) -> Log {
    let event = CertificateIssued {
        issuer: ISSUER,
        holderId: holder.to_string(),
        metadataURI: uri.to_string(),
    };
    mined(event.encode_log_data(), block, index)
}

/// `CertificateRevoked` with the holder in event data
pub fn revoked_log(block: u64, index: u64, holder: &str, uri: &str) -> Log {
    let event = CertificateRevoked {
        issuer: ISSUER,
        holderId: holder.to_string(),
        metadataURI: uri.to_string(),
    };
    mined(event.encode_log_data(), block, index)
}

/// `CertificateIssued` with only the holder hash as a topic
pub fn hashed_issued_log(block: u64, index: u64, holder: &str, uri: &str) -> Log {
    let event = ICertificateRegistryHashed::CertificateIssued {
        issuer: ISSUER,
        holderId: keccak256(holder.as_bytes()),
        metadataURI: uri.to_string(),
    };
    mined(event.encode_log_data(), block, index)
}

/// `CertificateRevoked` with only the holder hash as a topic
pub fn hashed_revoked_log(block: u64, index: u64, holder: &str, uri: &str) -> Log {
    let event = ICertificateRegistryHashed::CertificateRevoked {
        issuer: ISSUER,
        holderId: keccak256(holder.as_bytes()),
        metadataURI: uri.to_string(),
    };
    mined(event.encode_log_data(), block, index)
}

pub fn issuer_added_log(address: Address, block: u64, index: u64) -> Log {
    mined(IssuerAdded { issuer: address }.encode_log_data(), block, index)
}

pub fn issuer_removed_log(address: Address, block: u64, index: u64) -> Log {
    mined(IssuerRemoved { issuer: address }.encode_log_data(), block, index)
}

/// Call data of an `issueCertificate` transaction
pub fn issue_call(holder: &str, uri: &str) -> Bytes {
    let call = vericred_chain::abi::IssueCall {
        holderId: holder.to_string(),
        metadataURI: uri.to_string(),
    };
    Bytes::from(call.abi_encode())
}

/// In-memory chain node
#[derive(Default)]
pub struct MockChain {
    pub logs: Vec<Log>,
    pub latest: u64,
    pub missing_blocks: HashSet<u64>,
    pub block_delays: HashMap<u64, Duration>,
    pub transactions: HashMap<TxHash, Bytes>,
    pub issuers: Vec<Address>,
    pub fail_logs: bool,
    pub filters: Mutex<Vec<LogFilter>>,
}

impl MockChain {
    pub fn with_logs(logs: Vec<Log>) -> Self {
        let latest = logs.iter().filter_map(|l| l.block_number).max().unwrap_or(0);
        Self {
            logs,
            latest,
            ..Default::default()
        }
    }

    fn bound(&self, tag: BlockTag) -> u64 {
        match tag {
            BlockTag::Earliest => 0,
            BlockTag::Latest => self.latest,
            BlockTag::Number(n) => n,
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn block_number(&self) -> vericred_chain::Result<u64> {
        Ok(self.latest)
    }

    async fn get_logs(&self, filter: &LogFilter) -> vericred_chain::Result<Vec<Log>> {
        self.filters.lock().push(filter.clone());
        if self.fail_logs {
            return Err(ChainError::Transport("connection refused".into()));
        }
        let (from, to) = (self.bound(filter.from_block), self.bound(filter.to_block));
        Ok(self
            .logs
            .iter()
            .filter(|log| log.topic0() == Some(&filter.topic0))
            .filter(|log| log.block_number.map_or(false, |b| b >= from && b <= to))
            .cloned()
            .collect())
    }

    async fn get_block(&self, id: BlockId) -> vericred_chain::Result<Option<BlockHeader>> {
        let number = match id {
            BlockId::Number(n) => n,
            BlockId::Hash(hash) => {
                let mut tail = [0u8; 8];
                tail.copy_from_slice(&hash[24..]);
                u64::from_be_bytes(tail)
            }
        };
        if let Some(delay) = self.block_delays.get(&number) {
            tokio::time::sleep(*delay).await;
        }
        if self.missing_blocks.contains(&number) {
            return Ok(None);
        }
        Ok(Some(BlockHeader {
            number,
            hash: Some(block_hash(number)),
            timestamp: GENESIS_TIME + number * 12,
        }))
    }

    async fn get_transaction(&self, hash: TxHash) -> vericred_chain::Result<Option<Transaction>> {
        Ok(self.transactions.get(&hash).map(|input| Transaction {
            hash,
            from: ISSUER,
            to: Some(CONTRACT),
            input: input.clone(),
        }))
    }

    async fn call(&self, _to: Address, data: Bytes) -> vericred_chain::Result<Bytes> {
        if ownerCall::abi_decode(&data, true).is_ok() {
            return Ok(Bytes::from(ownerCall::abi_encode_returns(&(OWNER,))));
        }
        if let Ok(call) = isIssuerCall::abi_decode(&data, true) {
            let flag = self.issuers.contains(&call.account);
            return Ok(Bytes::from(isIssuerCall::abi_encode_returns(&(flag,))));
        }
        Err(ChainError::Rpc {
            code: -32000,
            message: "execution reverted".into(),
        })
    }
}

/// In-memory metadata gateway
#[derive(Default)]
pub struct MockFetcher {
    pub documents: HashMap<String, Value>,
    pub delays: HashMap<String, Duration>,
    pub requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn with_documents(documents: Vec<(&str, Value)>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|(uri, doc)| (uri.to_string(), doc))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MetadataFetcher for MockFetcher {
    async fn fetch(&self, uri: &str) -> MetadataOutcome {
        self.requested.lock().push(uri.to_string());
        if let Some(delay) = self.delays.get(uri) {
            tokio::time::sleep(*delay).await;
        }
        if !uri.starts_with("ipfs://") {
            return MetadataOutcome::Rejected {
                reason: format!("Invalid IPFS URI: {}", uri),
            };
        }
        match self.documents.get(uri) {
            Some(doc) => MetadataOutcome::Fetched(doc.clone()),
            None => MetadataOutcome::Failed {
                reason: "Request error: network error".into(),
            },
        }
    }
}

/// Pinning service double
#[derive(Default)]
pub struct MockPinner {
    pub missing_credentials: bool,
    pub pinned: Mutex<Vec<CertificateFields>>,
}

#[async_trait]
impl PinningService for MockPinner {
    async fn pin(&self, fields: &CertificateFields) -> Result<PinReceipt, PinningError> {
        if self.missing_credentials {
            return Err(PinningError::MissingCredentials);
        }
        self.pinned.lock().push(fields.clone());
        Ok(PinReceipt {
            id: "QmPinned".into(),
            size: 512,
            timestamp: "2024-03-01T12:00:00.000Z".into(),
        })
    }
}

pub fn config(encoding: HolderEncoding) -> IndexerConfig {
    let mut config = IndexerConfig::default();
    config.chain.contract_address = Some(CONTRACT);
    config.chain.holder_encoding = encoding;
    config
}

pub fn query(chain: MockChain, fetcher: MockFetcher) -> CertificateQuery {
    query_with(chain, fetcher, MockPinner::default(), config(HolderEncoding::EventData))
}

pub fn query_with(
    chain: MockChain,
    fetcher: MockFetcher,
    pinner: MockPinner,
    config: IndexerConfig,
) -> CertificateQuery {
    CertificateQuery::new(Arc::new(chain), Arc::new(fetcher), Arc::new(pinner), config)
}
