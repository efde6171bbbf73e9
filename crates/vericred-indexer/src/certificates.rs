//! Certificate reconstruction from issued and revoked event logs

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use vericred_chain::abi::decode_issue_call;
use vericred_chain::{BlockId, CertificateEvent, ChainLogReader, DecodeError, HolderField, RejectedLog};
use vericred_core::{
    CertificateMetadata, CertificateRecord, LogPosition, MetadataStatus, ReconstructionConfig,
    TimestampSource, TxHash,
};
use vericred_ipfs::{MetadataFetcher, MetadataOutcome};

use crate::error::{IndexerError, Result};

/// An issuance with a known holder and the outcome of its fetches
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedIssuance {
    /// Decoded `CertificateIssued` event
    pub event: CertificateEvent,
    /// Plain holder identifier
    pub holder: String,
    /// Timestamp of the containing block, `None` when it could not be fetched
    pub block_timestamp: Option<DateTime<Utc>>,
    /// Metadata lookup result
    pub metadata: MetadataOutcome,
}

/// An issuance left out of a reconstruction pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedIssuance {
    /// Issuing transaction, if known
    pub transaction_hash: Option<TxHash>,
    /// Log position, if known
    pub position: Option<LogPosition>,
    /// Why it was skipped
    pub reason: String,
}

impl From<&RejectedLog> for SkippedIssuance {
    fn from(rejected: &RejectedLog) -> Self {
        Self {
            transaction_hash: rejected.transaction_hash,
            position: rejected.position,
            reason: rejected.reason.to_string(),
        }
    }
}

impl SkippedIssuance {
    fn for_event(event: &CertificateEvent, reason: String) -> Self {
        Self {
            transaction_hash: Some(event.transaction_hash),
            position: Some(event.position),
            reason,
        }
    }
}

/// Output of one reconstruction pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateSet {
    /// Records, newest first
    pub records: Vec<CertificateRecord>,
    /// Issuances that could not be decoded or resolved
    pub skipped: Vec<SkippedIssuance>,
}

/// Rebuilds certificate records from the contract's event history
#[derive(Clone)]
pub struct CertificateReconstructor {
    reader: ChainLogReader,
    fetcher: Arc<dyn MetadataFetcher>,
    config: ReconstructionConfig,
}

impl CertificateReconstructor {
    /// Create a reconstructor
    pub fn new(
        reader: ChainLogReader,
        fetcher: Arc<dyn MetadataFetcher>,
        config: ReconstructionConfig,
    ) -> Self {
        Self {
            reader,
            fetcher,
            config,
        }
    }

    /// Run a pass, stamping records without a block timestamp with the
    /// current time
    pub async fn reconstruct(&self) -> Result<CertificateSet> {
        self.reconstruct_with_clock(Utc::now()).await
    }

    /// Run a pass with an explicit fallback clock reading.
    ///
    /// Fails only when a log query fails. Everything per-certificate
    /// degrades: an unresolvable holder skips that issuance, a missing block
    /// falls back to `clock`, missing metadata falls back to default text.
    #[instrument(skip(self), fields(from = %self.config.from_block, to = %self.config.to_block))]
    pub async fn reconstruct_with_clock(&self, clock: DateTime<Utc>) -> Result<CertificateSet> {
        let logs = self
            .reader
            .certificate_logs(self.config.from_block, self.config.to_block)
            .await
            .map_err(IndexerError::CertificateLogs)?;

        let mut skipped: Vec<SkippedIssuance> =
            logs.issued.rejected.iter().map(SkippedIssuance::from).collect();

        let resolved: Vec<_> = stream::iter(logs.issued.events)
            .map(|event| self.resolve(event))
            .buffered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut issued = Vec::with_capacity(resolved.len());
        for outcome in resolved {
            match outcome {
                Ok(issuance) => issued.push(issuance),
                Err(skip) => skipped.push(skip),
            }
        }

        let records = assemble(issued, &logs.revoked.events, clock);
        info!(
            "Reconstructed {} certificates ({} skipped, {} revocation events)",
            records.len(),
            skipped.len(),
            logs.revoked.events.len()
        );

        Ok(CertificateSet { records, skipped })
    }

    async fn resolve(
        &self,
        event: CertificateEvent,
    ) -> std::result::Result<ResolvedIssuance, SkippedIssuance> {
        let holder = match self.resolve_holder(&event).await {
            Ok(holder) => holder,
            Err(reason) => {
                warn!(
                    "Skipping certificate in transaction {}: {}",
                    event.transaction_hash, reason
                );
                return Err(SkippedIssuance::for_event(&event, reason));
            }
        };

        let (block_timestamp, metadata) =
            tokio::join!(self.block_timestamp(&event), self.metadata(&event.metadata_uri));

        Ok(ResolvedIssuance {
            event,
            holder,
            block_timestamp,
            metadata,
        })
    }

    /// Plain holder of an issuance, recovered from the issuing call when the
    /// event only carries its hash
    async fn resolve_holder(&self, event: &CertificateEvent) -> std::result::Result<String, String> {
        if let HolderField::Plain(holder) = &event.holder {
            return Ok(holder.clone());
        }

        let limit = self.config.fetch_timeout();
        let tx = match timeout(limit, self.reader.client().get_transaction(event.transaction_hash)).await {
            Ok(Ok(Some(tx))) => tx,
            Ok(Ok(None)) => return Err("issuing transaction not found".to_string()),
            Ok(Err(e)) => return Err(format!("transaction fetch failed: {}", e)),
            Err(_) => return Err(timeout_reason("transaction fetch", limit)),
        };

        let call = decode_issue_call(&tx.input).map_err(|e| e.to_string())?;
        if !event.holder.matches(&call.holderId) {
            return Err(DecodeError::HolderHashMismatch.to_string());
        }
        Ok(call.holderId)
    }

    async fn block_timestamp(&self, event: &CertificateEvent) -> Option<DateTime<Utc>> {
        let id = event
            .block_hash
            .map(BlockId::Hash)
            .unwrap_or(BlockId::Number(event.position.block_number));

        let limit = self.config.fetch_timeout();
        match timeout(limit, self.reader.client().get_block(id)).await {
            Ok(Ok(Some(header))) => {
                let ts = i64::try_from(header.timestamp)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                if ts.is_none() {
                    warn!("Block {} has out-of-range timestamp {}", id, header.timestamp);
                }
                ts
            }
            Ok(Ok(None)) => {
                warn!("Block {} not found, using reconstruction clock", id);
                None
            }
            Ok(Err(e)) => {
                warn!("Failed to fetch block {}: {}", id, e);
                None
            }
            Err(_) => {
                warn!("{} for block {}", timeout_reason("Block fetch", limit), id);
                None
            }
        }
    }

    async fn metadata(&self, uri: &str) -> MetadataOutcome {
        let limit = self.config.fetch_timeout();
        match timeout(limit, self.fetcher.fetch(uri)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let reason = timeout_reason("metadata fetch", limit);
                warn!("{} for {}", reason, uri);
                MetadataOutcome::Failed { reason }
            }
        }
    }
}

fn timeout_reason(what: &str, limit: Duration) -> String {
    format!("{} timed out after {}ms", what, limit.as_millis())
}

/// Build the final record list from resolved issuances.
///
/// - Each revocation, in chain order, revokes the earliest issuance emitted
///   before it with the same `(holderId, metadataURI)` that is not already
///   revoked.
/// - `onChainIndex` counts a holder's issuances in chain order.
/// - The result is ordered by `issuedAt` descending, ties in chain order.
pub fn assemble(
    mut issued: Vec<ResolvedIssuance>,
    revoked: &[CertificateEvent],
    clock: DateTime<Utc>,
) -> Vec<CertificateRecord> {
    issued.sort_by_key(|issuance| issuance.event.position);

    let mut revocations: Vec<&CertificateEvent> = revoked.iter().collect();
    revocations.sort_by_key(|event| event.position);

    let mut is_revoked = vec![false; issued.len()];
    for revocation in revocations {
        let target = issued.iter().enumerate().position(|(i, issuance)| {
            !is_revoked[i]
                && issuance.event.position < revocation.position
                && issuance.event.metadata_uri == revocation.metadata_uri
                && revocation.holder.matches(&issuance.holder)
        });
        match target {
            Some(i) => is_revoked[i] = true,
            None => debug!(
                "Revocation at {} matches no outstanding issuance",
                revocation.position
            ),
        }
    }

    let mut counters: HashMap<String, u64> = HashMap::new();
    let indices: Vec<u64> = issued
        .iter()
        .map(|issuance| {
            let next = counters.entry(issuance.holder.clone()).or_insert(0);
            let index = *next;
            *next += 1;
            index
        })
        .collect();

    let mut records: Vec<CertificateRecord> = issued
        .into_iter()
        .zip(is_revoked)
        .zip(indices)
        .map(|((issuance, revoked), index)| to_record(issuance, revoked, index, clock))
        .collect();

    records.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
    records
}

fn to_record(
    issuance: ResolvedIssuance,
    revoked: bool,
    on_chain_index: u64,
    clock: DateTime<Utc>,
) -> CertificateRecord {
    let (issued_at, timestamp_source) = match issuance.block_timestamp {
        Some(ts) => (ts, TimestampSource::Block),
        None => (clock, TimestampSource::ReconstructionClock),
    };

    let (metadata, metadata_status) = match issuance.metadata.metadata() {
        Some(metadata) => (metadata, MetadataStatus::Fetched),
        None => (CertificateMetadata::default(), MetadataStatus::Fallback),
    };

    CertificateRecord {
        issuer_address: issuance.event.issuer,
        holder_address: issuance.holder,
        metadata_uri: issuance.event.metadata_uri,
        issued_at,
        timestamp_source,
        revoked,
        title: metadata.title_or_default().to_string(),
        description: metadata.description_or_default().to_string(),
        issuer_name: metadata.issuer_name_or_default().to_string(),
        recipient_name: metadata.recipient_name_or_default().to_string(),
        metadata_status,
        transaction_hash: issuance.event.transaction_hash,
        on_chain_index,
        position: issuance.event.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Address, B256};
    use chrono::TimeZone;
    use serde_json::json;
    use vericred_core::certificate::{FALLBACK_DESCRIPTION, FALLBACK_ISSUER_NAME, FALLBACK_TITLE};

    fn event(block: u64, index: u64, holder: HolderField, uri: &str) -> CertificateEvent {
        CertificateEvent {
            position: LogPosition::new(block, index),
            block_hash: None,
            transaction_hash: B256::with_last_byte((block * 10 + index) as u8),
            issuer: Address::repeat_byte(0x11),
            holder,
            metadata_uri: uri.to_string(),
        }
    }

    fn issuance(block: u64, index: u64, holder: &str, uri: &str) -> ResolvedIssuance {
        ResolvedIssuance {
            event: event(block, index, HolderField::Plain(holder.to_string()), uri),
            holder: holder.to_string(),
            block_timestamp: Utc.timestamp_opt(1_700_000_000 + block as i64, 0).single(),
            metadata: MetadataOutcome::Fetched(json!({ "achievement": { "title": uri } })),
        }
    }

    fn revocation(block: u64, index: u64, holder: &str, uri: &str) -> CertificateEvent {
        event(block, index, HolderField::Plain(holder.to_string()), uri)
    }

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn find(records: &[CertificateRecord], block: u64) -> &CertificateRecord {
        records
            .iter()
            .find(|r| r.position.block_number == block)
            .expect("record")
    }

    #[test]
    fn test_no_revocations() {
        let records = assemble(
            vec![issuance(1, 0, "0xa", "ipfs://1"), issuance(2, 0, "0xb", "ipfs://2")],
            &[],
            clock(),
        );
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.revoked));
    }

    #[test]
    fn test_revocation_hits_earliest_outstanding() {
        let issued = vec![
            issuance(1, 0, "0xa", "ipfs://same"),
            issuance(2, 0, "0xa", "ipfs://same"),
            issuance(3, 0, "0xa", "ipfs://other"),
        ];
        let records = assemble(issued, &[revocation(4, 0, "0xa", "ipfs://same")], clock());

        assert!(find(&records, 1).revoked);
        assert!(!find(&records, 2).revoked);
        assert!(!find(&records, 3).revoked);
    }

    #[test]
    fn test_second_revocation_moves_on() {
        let issued = vec![
            issuance(1, 0, "0xa", "ipfs://same"),
            issuance(2, 0, "0xa", "ipfs://same"),
        ];
        let revoked = [
            revocation(6, 0, "0xa", "ipfs://same"),
            revocation(5, 0, "0xa", "ipfs://same"),
        ];
        let records = assemble(issued, &revoked, clock());
        assert!(records.iter().all(|r| r.revoked));
    }

    #[test]
    fn test_revocation_before_issuance_is_ignored() {
        let issued = vec![issuance(5, 0, "0xa", "ipfs://x")];
        let records = assemble(issued, &[revocation(4, 0, "0xa", "ipfs://x")], clock());
        assert!(!records[0].revoked);
    }

    #[test]
    fn test_revocation_key_is_exact() {
        let issued = vec![issuance(1, 0, "0xAB", "ipfs://x")];
        let revoked = [
            revocation(2, 0, "0xab", "ipfs://x"),
            revocation(2, 1, "0xAB", "ipfs://y"),
        ];
        let records = assemble(issued, &revoked, clock());
        assert!(!records[0].revoked);
    }

    #[test]
    fn test_hashed_revocation() {
        let issued = vec![issuance(1, 0, "0xa", "ipfs://x")];
        let revoked = [event(
            2,
            0,
            HolderField::Hashed(keccak256("0xa".as_bytes())),
            "ipfs://x",
        )];
        let records = assemble(issued, &revoked, clock());
        assert!(records[0].revoked);
    }

    #[test]
    fn test_indices_follow_chain_order() {
        // input deliberately out of order
        let issued = vec![
            issuance(9, 0, "0xa", "ipfs://3"),
            issuance(2, 1, "0xb", "ipfs://b"),
            issuance(2, 0, "0xa", "ipfs://1"),
            issuance(4, 0, "0xa", "ipfs://2"),
        ];
        let records = assemble(issued, &[], clock());

        let index_of = |uri: &str| {
            records
                .iter()
                .find(|r| r.metadata_uri == uri)
                .map(|r| r.on_chain_index)
                .unwrap()
        };
        assert_eq!(index_of("ipfs://1"), 0);
        assert_eq!(index_of("ipfs://2"), 1);
        assert_eq!(index_of("ipfs://3"), 2);
        assert_eq!(index_of("ipfs://b"), 0);
    }

    #[test]
    fn test_sorted_newest_first() {
        let issued = vec![
            issuance(1, 0, "0xa", "ipfs://1"),
            issuance(3, 0, "0xa", "ipfs://3"),
            issuance(2, 0, "0xa", "ipfs://2"),
        ];
        let records = assemble(issued, &[], clock());
        let blocks: Vec<u64> = records.iter().map(|r| r.position.block_number).collect();
        assert_eq!(blocks, vec![3, 2, 1]);
    }

    #[test]
    fn test_fallbacks() {
        let mut degraded = issuance(1, 0, "0xa", "ipfs://1");
        degraded.block_timestamp = None;
        degraded.metadata = MetadataOutcome::Failed {
            reason: "gateway down".into(),
        };

        let records = assemble(vec![degraded, issuance(2, 0, "0xa", "ipfs://2")], &[], clock());
        let record = find(&records, 1);

        assert_eq!(record.issued_at, clock());
        assert_eq!(record.timestamp_source, TimestampSource::ReconstructionClock);
        assert_eq!(record.metadata_status, MetadataStatus::Fallback);
        assert_eq!(record.title, FALLBACK_TITLE);
        assert_eq!(record.description, FALLBACK_DESCRIPTION);
        assert_eq!(record.issuer_name, FALLBACK_ISSUER_NAME);
        assert_eq!(record.on_chain_index, 0);

        let healthy = find(&records, 2);
        assert_eq!(healthy.timestamp_source, TimestampSource::Block);
        assert_eq!(healthy.metadata_status, MetadataStatus::Fetched);
        assert_eq!(healthy.on_chain_index, 1);
    }
}
