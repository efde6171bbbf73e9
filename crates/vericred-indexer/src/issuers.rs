//! Issuer membership reconstruction

use alloy_primitives::Address;
use std::collections::HashMap;
use tracing::{info, instrument};

use vericred_chain::{ChainLogReader, IssuerEvent};
use vericred_core::{IssuerConfig, IssuerRecord};

use crate::error::{IndexerError, Result};

/// Fold issuer events into current memberships.
///
/// Events are applied in `(blockNumber, logIndex)` order regardless of the
/// order they arrive in; the last event for an address wins. Records are
/// returned in order of each address's first appearance on chain.
pub fn fold_issuer_events(mut events: Vec<IssuerEvent>) -> Vec<IssuerRecord> {
    events.sort_by_key(|event| event.position);

    let mut slots: HashMap<Address, usize> = HashMap::new();
    let mut records: Vec<IssuerRecord> = Vec::new();

    for event in events {
        let is_active = event.kind.is_active();
        match slots.get(&event.address) {
            Some(&slot) => records[slot].is_active = is_active,
            None => {
                slots.insert(event.address, records.len());
                records.push(IssuerRecord {
                    address: event.address,
                    is_active,
                });
            }
        }
    }

    records
}

/// Rebuilds issuer memberships from the contract's event history.
///
/// With a recent-block window only changes inside the window are seen: an
/// issuer added before the window and never touched since is absent from
/// the result, and one removed before the window but re-added inside it is
/// reported as active. Use [`IssuerConfig::full_history`] for an exact view.
#[derive(Clone)]
pub struct IssuerReconstructor {
    reader: ChainLogReader,
    config: IssuerConfig,
}

impl IssuerReconstructor {
    /// Create a reconstructor
    pub fn new(reader: ChainLogReader, config: IssuerConfig) -> Self {
        Self { reader, config }
    }

    /// Run a pass
    #[instrument(skip(self), fields(window = self.config.window_blocks))]
    pub async fn reconstruct(&self) -> Result<Vec<IssuerRecord>> {
        let (from, to) = self
            .reader
            .window_range(self.config.window())
            .await
            .map_err(IndexerError::IssuerLogs)?;

        let logs = self
            .reader
            .issuer_logs(from, to)
            .await
            .map_err(IndexerError::IssuerLogs)?;

        let records = fold_issuer_events(logs.events);
        info!(
            "Reconstructed {} issuers ({} active) from blocks {}..{}",
            records.len(),
            records.iter().filter(|r| r.is_active).count(),
            from,
            to
        );
        Ok(records)
    }
}
