//! Contract event log reader

use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use vericred_core::{BlockTag, HolderEncoding, LogPosition, TxHash};

use crate::abi::ICertificateRegistry::{CertificateIssued, CertificateRevoked};
use crate::client::{log_position, ChainClient, Log, LogFilter};
use crate::error::{DecodeError, Result};
use crate::events::{CertificateEvent, IssuerEvent, IssuerEventKind};

/// A log that could not be decoded and was left out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedLog {
    /// Emitting transaction, if known
    pub transaction_hash: Option<TxHash>,
    /// Log position, if known
    pub position: Option<LogPosition>,
    /// Why the log was rejected
    pub reason: DecodeError,
}

/// Decoded events together with the logs that failed to decode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedLogs<T> {
    /// Successfully decoded events, in the order the node returned them
    pub events: Vec<T>,
    /// Logs rejected by the decoder
    pub rejected: Vec<RejectedLog>,
}

impl<T> Default for DecodedLogs<T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> DecodedLogs<T> {
    /// Decode a batch of logs.
    ///
    /// A log seen again with the same transaction hash and position is the
    /// same on-chain event returned twice by the node, and is dropped.
    fn decode_all<F>(logs: Vec<Log>, event: &str, decode: F) -> Self
    where
        F: Fn(&Log) -> std::result::Result<T, DecodeError>,
    {
        let mut decoded = Self::default();
        let mut seen = HashSet::new();
        for log in logs {
            let position = log_position(&log);
            if let (Some(tx), Some(position)) = (log.transaction_hash, position) {
                if !seen.insert((tx, position)) {
                    debug!("Dropping repeated {} log {} at {}", event, tx, position);
                    continue;
                }
            }

            match decode(&log) {
                Ok(ev) => decoded.events.push(ev),
                Err(reason) => {
                    warn!(
                        "Skipping undecodable {} log {:?} at {:?}: {}",
                        event, log.transaction_hash, position, reason
                    );
                    decoded.rejected.push(RejectedLog {
                        transaction_hash: log.transaction_hash,
                        position,
                        reason,
                    });
                }
            }
        }
        decoded
    }

    /// Append another batch
    pub fn extend(&mut self, other: DecodedLogs<T>) {
        self.events.extend(other.events);
        self.rejected.extend(other.rejected);
    }
}

/// Issued and revoked certificate events from one query pair
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateLogs {
    /// `CertificateIssued` events
    pub issued: DecodedLogs<CertificateEvent>,
    /// `CertificateRevoked` events
    pub revoked: DecodedLogs<CertificateEvent>,
}

/// Reads and decodes the certificate contract's event logs
#[derive(Clone)]
pub struct ChainLogReader {
    client: Arc<dyn ChainClient>,
    contract: Address,
    encoding: HolderEncoding,
}

impl ChainLogReader {
    /// Create a reader for one deployed contract
    pub fn new(client: Arc<dyn ChainClient>, contract: Address, encoding: HolderEncoding) -> Self {
        Self {
            client,
            contract,
            encoding,
        }
    }

    /// Underlying chain client
    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Fetch issued and revoked certificate events concurrently.
    ///
    /// Any failure of either query fails the whole call.
    #[instrument(skip(self))]
    pub async fn certificate_logs(&self, from: BlockTag, to: BlockTag) -> Result<CertificateLogs> {
        let issued_filter =
            LogFilter::new(self.contract, CertificateIssued::SIGNATURE_HASH).with_range(from, to);
        let revoked_filter =
            LogFilter::new(self.contract, CertificateRevoked::SIGNATURE_HASH).with_range(from, to);

        let (issued, revoked) = tokio::try_join!(
            self.client.get_logs(&issued_filter),
            self.client.get_logs(&revoked_filter)
        )?;

        info!(
            "Fetched {} issued logs and {} revoked logs",
            issued.len(),
            revoked.len()
        );

        let encoding = self.encoding;
        Ok(CertificateLogs {
            issued: DecodedLogs::decode_all(issued, "CertificateIssued", |log| {
                CertificateEvent::decode(log, encoding)
            }),
            revoked: DecodedLogs::decode_all(revoked, "CertificateRevoked", |log| {
                CertificateEvent::decode(log, encoding)
            }),
        })
    }

    /// Fetch issuer added and removed events concurrently, merged into one
    /// unordered collection
    #[instrument(skip(self))]
    pub async fn issuer_logs(&self, from: BlockTag, to: BlockTag) -> Result<DecodedLogs<IssuerEvent>> {
        let added_filter = LogFilter::new(self.contract, IssuerEventKind::Added.signature_hash())
            .with_range(from, to);
        let removed_filter = LogFilter::new(self.contract, IssuerEventKind::Removed.signature_hash())
            .with_range(from, to);

        let (added, removed) = tokio::try_join!(
            self.client.get_logs(&added_filter),
            self.client.get_logs(&removed_filter)
        )?;

        info!(
            "Fetched {} issuer-added logs and {} issuer-removed logs",
            added.len(),
            removed.len()
        );

        let mut merged = DecodedLogs::decode_all(added, "IssuerAdded", |log| {
            IssuerEvent::decode(log, IssuerEventKind::Added)
        });
        merged.extend(DecodedLogs::decode_all(removed, "IssuerRemoved", |log| {
            IssuerEvent::decode(log, IssuerEventKind::Removed)
        }));
        Ok(merged)
    }

    /// Resolve an optional recent-block window into a block range.
    ///
    /// `None` scans from genesis. With a window, the range starts at
    /// `latest - window` (saturating at zero) and events before it are not
    /// seen.
    pub async fn window_range(&self, window_blocks: Option<u64>) -> Result<(BlockTag, BlockTag)> {
        match window_blocks {
            None => Ok((BlockTag::Earliest, BlockTag::Latest)),
            Some(window) => {
                let latest = self.client.block_number().await?;
                Ok((
                    BlockTag::Number(latest.saturating_sub(window)),
                    BlockTag::Number(latest),
                ))
            }
        }
    }
}
