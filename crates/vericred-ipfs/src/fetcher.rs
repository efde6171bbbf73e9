//! Metadata retrieval through an HTTP gateway

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use vericred_core::{CertificateMetadata, IpfsConfig};

use crate::error::MetadataError;
use crate::uri::{normalize_gateway, ContentUri};

/// Result of one metadata lookup.
///
/// Distinguishes "no document" from "lookup failed" without overloading a
/// null value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataOutcome {
    /// Document retrieved and parsed as JSON
    Fetched(Value),
    /// URI is not a content address; nothing was requested
    Rejected {
        /// Why the URI was rejected
        reason: String,
    },
    /// Request failed, returned a non-success status or a non-JSON body
    Failed {
        /// Failure description
        reason: String,
    },
}

impl MetadataOutcome {
    /// Retrieved document, if any
    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Fetched(doc) => Some(doc),
            _ => None,
        }
    }

    /// Display fields of the retrieved document, if any
    pub fn metadata(&self) -> Option<CertificateMetadata> {
        self.document().map(CertificateMetadata::from_json)
    }
}

/// Source of certificate metadata documents
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the document behind `uri`. Never fails; see [`MetadataOutcome`].
    async fn fetch(&self, uri: &str) -> MetadataOutcome;
}

/// Fetches documents from an IPFS HTTP gateway
pub struct GatewayFetcher {
    client: Client,
    gateway: Url,
}

impl GatewayFetcher {
    /// Build a fetcher from configuration
    pub fn new(config: &IpfsConfig) -> Result<Self, MetadataError> {
        let gateway = normalize_gateway(&config.gateway_url)?;
        let client = Client::builder()
            .user_agent(concat!("vericred-ipfs/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| MetadataError::Configuration(e.to_string()))?;
        Ok(Self::with_client(client, gateway))
    }

    /// Build a fetcher around an existing HTTP client
    pub fn with_client(client: Client, gateway: Url) -> Self {
        Self { client, gateway }
    }

    /// Gateway base URL
    pub fn gateway(&self) -> &Url {
        &self.gateway
    }

    async fn fetch_json(&self, uri: &ContentUri) -> Result<Value, MetadataError> {
        let url = uri.gateway_url(&self.gateway)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MetadataError::Request(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| MetadataError::InvalidJson(e.to_string()))
    }
}

#[async_trait]
impl MetadataFetcher for GatewayFetcher {
    async fn fetch(&self, uri: &str) -> MetadataOutcome {
        let parsed = match ContentUri::parse(uri) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid IPFS URI provided: {}", uri);
                return MetadataOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        match self.fetch_json(&parsed).await {
            Ok(doc) => {
                debug!("Fetched metadata for CID {}", parsed.cid());
                MetadataOutcome::Fetched(doc)
            }
            Err(e) => {
                warn!("Error fetching metadata for CID {}: {}", parsed.cid(), e);
                MetadataOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
