//! Pinning new certificate documents

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use vericred_core::config::PinningCredentials;
use vericred_core::IpfsConfig;

use crate::error::PinningError;
use crate::uri::ContentUri;

/// Operator-supplied fields of a new certificate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFields {
    /// Recipient display name
    pub recipient_name: String,
    /// Recipient e-mail address
    pub recipient_email: String,
    /// Certificate title
    pub certificate_title: String,
    /// Certificate description
    pub certificate_description: String,
}

impl CertificateFields {
    /// Metadata document as stored on IPFS
    pub fn document(&self, issued_on: DateTime<Utc>) -> Value {
        json!({
            "name": format!("{} - {}", self.certificate_title, self.recipient_name),
            "description": self.certificate_description,
            "recipient": {
                "name": self.recipient_name,
                "email": self.recipient_email,
            },
            "achievement": {
                "title": self.certificate_title,
                "description": self.certificate_description,
            },
            "issuedOn": issued_on.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Pin label: the title with each whitespace character replaced by `_`
    pub fn pin_name(&self) -> String {
        let stem: String = self
            .certificate_title
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("{}.json", stem)
    }
}

/// Result of a successful pin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinReceipt {
    /// Content identifier of the pinned document
    pub id: String,
    /// Pinned size in bytes
    pub size: u64,
    /// Pin timestamp as reported by the service
    pub timestamp: String,
}

impl PinReceipt {
    /// Metadata URI to pass to `issueCertificate`
    pub fn metadata_uri(&self) -> String {
        ContentUri::from_cid(self.id.clone()).to_string()
    }
}

/// A service that stores certificate documents
#[async_trait]
pub trait PinningService: Send + Sync {
    /// Pin the document built from `fields`
    async fn pin(&self, fields: &CertificateFields) -> Result<PinReceipt, PinningError>;
}

#[derive(Deserialize)]
struct PinataResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize")]
    pin_size: u64,
    #[serde(rename = "Timestamp")]
    timestamp: String,
}

/// Pinata `pinJSONToIPFS` client
pub struct PinataClient {
    client: Client,
    endpoint: Url,
    credentials: Option<PinningCredentials>,
}

impl PinataClient {
    /// Build a client from configuration. Missing credentials are reported
    /// when pinning, not here.
    pub fn new(config: &IpfsConfig) -> Result<Self, PinningError> {
        let endpoint = Url::parse(&config.pinning_url).map_err(|e| {
            PinningError::Configuration(format!(
                "invalid pinning url {}: {}",
                config.pinning_url, e
            ))
        })?;
        let client = Client::builder()
            .user_agent(concat!("vericred-ipfs/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PinningError::Configuration(e.to_string()))?;
        Ok(Self::with_client(client, endpoint, config.credentials.clone()))
    }

    /// Build a client around an existing HTTP client
    pub fn with_client(
        client: Client,
        endpoint: Url,
        credentials: Option<PinningCredentials>,
    ) -> Self {
        Self {
            client,
            endpoint,
            credentials,
        }
    }

    /// Whether both API keys are present
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl PinningService for PinataClient {
    #[instrument(skip(self, fields), fields(title = %fields.certificate_title))]
    async fn pin(&self, fields: &CertificateFields) -> Result<PinReceipt, PinningError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PinningError::MissingCredentials)?;

        let body = json!({
            "pinataMetadata": { "name": fields.pin_name() },
            "pinataContent": fields.document(Utc::now()),
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("pinata_api_key", &credentials.api_key)
            .header("pinata_secret_api_key", &credentials.secret_api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Pinning failed with status {}", status);
            return Err(PinningError::Status {
                status: status.to_string(),
                body,
            });
        }

        let pinned: PinataResponse = response.json().await?;
        info!("Pinned certificate document {}", pinned.ipfs_hash);
        Ok(PinReceipt {
            id: pinned.ipfs_hash,
            size: pinned.pin_size,
            timestamp: pinned.timestamp,
        })
    }
}
