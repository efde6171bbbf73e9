//! Certificate records materialized from `CertificateIssued` events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Address, LogPosition, TxHash};

/// Title used when metadata has no `achievement.title`
pub const FALLBACK_TITLE: &str = "Untitled Certificate";
/// Description used when metadata has no `description`
pub const FALLBACK_DESCRIPTION: &str = "No description provided.";
/// Issuer name used when metadata has no `name`
pub const FALLBACK_ISSUER_NAME: &str = "Unknown Issuer";
/// Recipient name used when metadata has no `recipient.name`
pub const FALLBACK_RECIPIENT_NAME: &str = "Unknown Recipient";

/// Separator between issuer and recipient in the metadata `name` field
const NAME_SEPARATOR: &str = " - ";

/// Display fields extracted from a certificate's off-chain JSON document.
///
/// Every field is optional; empty strings are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    /// `achievement.title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// Leading segment of `name`
    pub issuer_name: Option<String>,
    /// `recipient.name`
    pub recipient_name: Option<String>,
}

impl CertificateMetadata {
    /// Extract display fields from a metadata document
    pub fn from_json(value: &Value) -> Self {
        let text = |pointer: &str| {
            value
                .pointer(pointer)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let issuer_name = text("/name").and_then(|name| {
            name.split(NAME_SEPARATOR)
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        Self {
            title: text("/achievement/title"),
            description: text("/description"),
            issuer_name,
            recipient_name: text("/recipient/name"),
        }
    }

    /// Title or its fallback
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(FALLBACK_TITLE)
    }

    /// Description or its fallback
    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(FALLBACK_DESCRIPTION)
    }

    /// Issuer name or its fallback
    pub fn issuer_name_or_default(&self) -> &str {
        self.issuer_name.as_deref().unwrap_or(FALLBACK_ISSUER_NAME)
    }

    /// Recipient name or its fallback
    pub fn recipient_name_or_default(&self) -> &str {
        self.recipient_name.as_deref().unwrap_or(FALLBACK_RECIPIENT_NAME)
    }
}

/// Whether the text fields of a record came from its metadata document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataStatus {
    /// Document fetched; absent fields still use fallbacks
    Fetched,
    /// Document unavailable; every text field is a fallback
    Fallback,
}

/// Origin of a record's `issued_at` value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampSource {
    /// Timestamp of the block that emitted the issuance event
    Block,
    /// Block unavailable; clock reading taken when the pass started
    ReconstructionClock,
}

/// One issued certificate, joined with its metadata and revocation status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Account that issued the certificate
    pub issuer_address: Address,
    /// Holder identifier exactly as stored by the contract
    pub holder_address: String,
    /// Content-address pointer to the metadata document
    #[serde(rename = "metadataURI")]
    pub metadata_uri: String,
    /// Issuance time
    pub issued_at: DateTime<Utc>,
    /// Where `issued_at` came from
    pub timestamp_source: TimestampSource,
    /// True iff a matching revocation event exists
    pub revoked: bool,
    /// Certificate title
    pub title: String,
    /// Certificate description
    pub description: String,
    /// Issuing organisation
    pub issuer_name: String,
    /// Recipient display name
    pub recipient_name: String,
    /// Whether text fields came from metadata
    pub metadata_status: MetadataStatus,
    /// Issuing transaction
    pub transaction_hash: TxHash,
    /// Zero-based position among this holder's certificates
    pub on_chain_index: u64,
    /// Position of the issuance event
    #[serde(flatten)]
    pub position: LogPosition,
}

impl CertificateRecord {
    /// Case-insensitive comparison of the holder identifier
    pub fn holder_matches(&self, holder: &str) -> bool {
        self.holder_address.eq_ignore_ascii_case(holder.trim())
    }
}
