//! JSON-RPC chain client over HTTP

use alloy_primitives::{Address, Bytes, U64};
use alloy_rpc_types_eth::{
    Block, BlockNumberOrTag, Filter, Transaction as RpcTransaction, TransactionInput,
    TransactionRequest, TransactionTrait,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument, warn};

use vericred_core::{ChainConfig, RetryConfig, TxHash};

use crate::client::{BlockHeader, BlockId, ChainClient, Log, LogFilter, Transaction};
use crate::error::{ChainError, Result};

/// Chain client speaking Ethereum JSON-RPC
pub struct JsonRpcClient {
    client: Client,
    url: Url,
    retry: RetryConfig,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Build a client from configuration
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let url = Url::parse(&config.rpc_url).map_err(|e| {
            ChainError::Configuration(format!("invalid rpc_url {}: {}", config.rpc_url, e))
        })?;
        let client = Client::builder()
            .user_agent(concat!("vericred/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChainError::Configuration(e.to_string()))?;

        Ok(Self::with_client(client, url, config.retry.clone()))
    }

    /// Build a client around an existing HTTP client
    pub fn with_client(client: Client, url: Url, retry: RetryConfig) -> Self {
        Self {
            client,
            url,
            retry,
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue a request, retrying transport failures with backoff
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let mut attempt = 0;
        loop {
            match self.send_once(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "{} failed (attempt {}), retrying in {:?}: {}",
                        method,
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(&self, method: &str, params: &Value) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self.client.post(self.url.clone()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let envelope: RpcResponse<T> = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        debug!("{} (id {}) ok", method, id);
        Ok(envelope.result)
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn block_number(&self) -> Result<u64> {
        let latest: U64 = self
            .request("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| ChainError::InvalidResponse("eth_blockNumber returned null".into()))?;
        Ok(latest.to::<u64>())
    }

    #[instrument(skip(self), fields(from = %filter.from_block, to = %filter.to_block))]
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>> {
        let filter = Filter::from(filter);
        let logs: Option<Vec<Log>> = self.request("eth_getLogs", json!([filter])).await?;
        Ok(logs.unwrap_or_default())
    }

    async fn get_block(&self, id: BlockId) -> Result<Option<BlockHeader>> {
        let block: Option<Block> = match id {
            BlockId::Hash(hash) => self.request("eth_getBlockByHash", json!([hash, false])).await?,
            BlockId::Number(n) => {
                self.request("eth_getBlockByNumber", json!([BlockNumberOrTag::Number(n), false]))
                    .await?
            }
        };
        Ok(block.map(|block| BlockHeader {
            number: block.header.number,
            hash: Some(block.header.hash),
            timestamp: block.header.timestamp,
        }))
    }

    async fn get_transaction(&self, hash: TxHash) -> Result<Option<Transaction>> {
        let tx: Option<RpcTransaction> = self
            .request("eth_getTransactionByHash", json!([hash]))
            .await?;
        Ok(tx.map(|tx| Transaction {
            hash,
            from: tx.from,
            to: tx.to(),
            input: tx.input().clone(),
        }))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        self.request("eth_call", json!([request, BlockNumberOrTag::Latest]))
            .await?
            .ok_or_else(|| ChainError::InvalidResponse("eth_call returned null".into()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX_LEN: usize = 256;
    if body.len() <= MAX_LEN {
        body.to_string()
    } else {
        let mut end = MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}
