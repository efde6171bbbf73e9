//! Typed contract events decoded from raw logs

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::{SolEvent, TopicList};
use serde::{Deserialize, Serialize};

use vericred_core::{HolderEncoding, LogPosition, TxHash};

use crate::abi::ICertificateRegistry::{
    CertificateIssued, CertificateRevoked, IssuerAdded, IssuerRemoved,
};
use crate::abi::ICertificateRegistryHashed::CertificateIssued as HashedCertificateIssued;
use crate::client::{log_position, Log};
use crate::error::DecodeError;

/// Holder identifier as carried by a certificate event
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolderField {
    /// Emitted as plain data
    Plain(String),
    /// Emitted only as an indexed topic, i.e. `keccak256(holderId)`
    Hashed(B256),
}

impl HolderField {
    /// Whether this field identifies `holder`
    pub fn matches(&self, holder: &str) -> bool {
        match self {
            Self::Plain(value) => value == holder,
            Self::Hashed(hash) => keccak256(holder.as_bytes()) == *hash,
        }
    }
}

/// A `CertificateIssued` or `CertificateRevoked` event.
///
/// Both events share one layout:
/// `(address indexed issuer, string holderId, string metadataURI)`, with
/// `holderId` optionally indexed depending on the deployed contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateEvent {
    /// Position of the log
    pub position: LogPosition,
    /// Containing block
    pub block_hash: Option<B256>,
    /// Emitting transaction
    pub transaction_hash: TxHash,
    /// Issuer account
    pub issuer: Address,
    /// Holder identifier
    pub holder: HolderField,
    /// Metadata URI
    pub metadata_uri: String,
}

impl CertificateEvent {
    /// Decode a `CertificateIssued` or `CertificateRevoked` log using the
    /// contract's holder encoding
    pub fn decode(log: &Log, encoding: HolderEncoding) -> Result<Self, DecodeError> {
        let (position, transaction_hash) = mined_fields(log)?;
        let topic0 = require_topic0(log)?;
        if topic0 != CertificateIssued::SIGNATURE_HASH && topic0 != CertificateRevoked::SIGNATURE_HASH {
            return Err(DecodeError::UnexpectedEvent(topic0));
        }

        // Issued and revoked share one layout, so either type decodes both
        let data = log.data();
        let (issuer, holder, metadata_uri) = match encoding {
            HolderEncoding::EventData => {
                require_topics::<CertificateIssued>(log)?;
                let (_, issuer) = CertificateIssued::decode_topics(data.topics())?;
                let (holder, metadata_uri) = CertificateIssued::abi_decode_data(&data.data, true)?;
                (issuer, HolderField::Plain(holder), metadata_uri)
            }
            HolderEncoding::TransactionInput => {
                require_topics::<HashedCertificateIssued>(log)?;
                let (_, issuer, holder_hash) = HashedCertificateIssued::decode_topics(data.topics())?;
                let (metadata_uri,) = HashedCertificateIssued::abi_decode_data(&data.data, true)?;
                (issuer, HolderField::Hashed(holder_hash), metadata_uri)
            }
        };

        Ok(Self {
            position,
            block_hash: log.block_hash,
            transaction_hash,
            issuer,
            holder,
            metadata_uri,
        })
    }
}

/// Kind of issuer membership change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuerEventKind {
    /// `IssuerAdded`
    Added,
    /// `IssuerRemoved`
    Removed,
}

impl IssuerEventKind {
    /// Event signature hash
    pub fn signature_hash(&self) -> B256 {
        match self {
            Self::Added => IssuerAdded::SIGNATURE_HASH,
            Self::Removed => IssuerRemoved::SIGNATURE_HASH,
        }
    }

    /// Membership after applying this event
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Added)
    }
}

/// An `IssuerAdded` or `IssuerRemoved` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerEvent {
    /// Added or removed
    pub kind: IssuerEventKind,
    /// Issuer account
    pub address: Address,
    /// Position of the log
    pub position: LogPosition,
}

impl IssuerEvent {
    /// Decode a log of a known kind
    pub fn decode(log: &Log, kind: IssuerEventKind) -> Result<Self, DecodeError> {
        let (position, _) = mined_fields(log)?;
        let topic0 = require_topic0(log)?;
        if topic0 != kind.signature_hash() {
            return Err(DecodeError::UnexpectedEvent(topic0));
        }

        // Added and removed carry the same single indexed address
        require_topics::<IssuerAdded>(log)?;
        let (_, address) = IssuerAdded::decode_topics(log.topics())?;

        Ok(Self {
            kind,
            address,
            position,
        })
    }
}

fn mined_fields(log: &Log) -> Result<(LogPosition, TxHash), DecodeError> {
    if log.removed {
        return Err(DecodeError::Removed);
    }
    let position = log_position(log).ok_or(DecodeError::Incomplete("block number or log index"))?;
    let tx = log
        .transaction_hash
        .ok_or(DecodeError::Incomplete("transaction hash"))?;
    Ok((position, tx))
}

fn require_topic0(log: &Log) -> Result<B256, DecodeError> {
    log.topic0().copied().ok_or(DecodeError::MissingTopics {
        expected: 1,
        found: 0,
    })
}

fn require_topics<E: SolEvent>(log: &Log) -> Result<(), DecodeError> {
    let expected = <E::TopicList as TopicList>::COUNT;
    let found = log.topics().len();
    if found < expected {
        return Err(DecodeError::MissingTopics { expected, found });
    }
    Ok(())
}
