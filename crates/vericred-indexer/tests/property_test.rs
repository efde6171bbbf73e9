//! Property-based tests for reconstruction invariants

use alloy_primitives::{Address, B256};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};

use vericred_chain::{CertificateEvent, HolderField, IssuerEvent, IssuerEventKind};
use vericred_core::LogPosition;
use vericred_indexer::{assemble, fold_issuer_events, ResolvedIssuance};
use vericred_ipfs::MetadataOutcome;

const HOLDERS: [&str; 4] = ["0xa", "0xB", "0xc", "holder-4"];

fn issuance(seq: usize, position: (u64, u64), holder: &str, healthy: bool) -> ResolvedIssuance {
    let (block, index) = position;
    ResolvedIssuance {
        event: CertificateEvent {
            position: LogPosition::new(block, index),
            block_hash: None,
            transaction_hash: B256::left_padding_from(&(seq as u64).to_be_bytes()),
            issuer: Address::repeat_byte(0x11),
            holder: HolderField::Plain(holder.to_string()),
            metadata_uri: format!("ipfs://Qm{}", seq),
        },
        holder: holder.to_string(),
        block_timestamp: if healthy {
            Utc.timestamp_opt(1_700_000_000 + block as i64 * 12, 0).single()
        } else {
            None
        },
        metadata: if healthy {
            MetadataOutcome::Fetched(json!({ "achievement": { "title": format!("cert {}", seq) } }))
        } else {
            MetadataOutcome::Failed {
                reason: "network error".into(),
            }
        },
    }
}

fn issuances() -> impl Strategy<Value = Vec<ResolvedIssuance>> {
    prop::collection::btree_set((0u64..500, 0u64..8), 0..40).prop_flat_map(|positions| {
        let n = positions.len();
        (
            Just(positions),
            prop::collection::vec(0..HOLDERS.len(), n),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(|(positions, holders, healthy)| {
                positions
                    .into_iter()
                    .enumerate()
                    .map(|(seq, pos)| issuance(seq, pos, HOLDERS[holders[seq]], healthy[seq]))
                    .collect::<Vec<_>>()
            })
    })
}

fn revocation_of(issued: &ResolvedIssuance, block: u64) -> CertificateEvent {
    CertificateEvent {
        position: LogPosition::new(block, 0),
        ..issued.event.clone()
    }
}

fn clock() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    #[test]
    fn prop_no_revocations_means_none_revoked(issued in issuances()) {
        let records = assemble(issued, &[], clock());
        prop_assert!(records.iter().all(|r| !r.revoked));
    }

    #[test]
    fn prop_indices_are_contiguous_per_holder(issued in issuances()) {
        let total = issued.len();
        let records = assemble(issued, &[], clock());
        prop_assert_eq!(records.len(), total);

        let mut by_holder: HashMap<&str, Vec<u64>> = HashMap::new();
        for record in &records {
            by_holder.entry(record.holder_address.as_str()).or_default().push(record.on_chain_index);
        }
        for indices in by_holder.values_mut() {
            indices.sort_unstable();
            let expected: Vec<u64> = (0..indices.len() as u64).collect();
            prop_assert_eq!(&*indices, &expected);
        }
    }

    #[test]
    fn prop_revocation_hits_exactly_its_record(
        (issued, mask) in issuances().prop_flat_map(|issued| {
            let n = issued.len();
            (Just(issued), prop::collection::vec(any::<bool>(), n))
        })
    ) {
        let chosen: BTreeSet<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, revoke)| **revoke)
            .map(|(i, _)| i)
            .collect();
        let revoked: Vec<CertificateEvent> = chosen
            .iter()
            .map(|&i| revocation_of(&issued[i], 1_000 + i as u64))
            .collect();
        let expected: BTreeSet<String> = chosen
            .iter()
            .map(|&i| issued[i].event.metadata_uri.clone())
            .collect();

        let records = assemble(issued, &revoked, clock());
        let actual: BTreeSet<String> = records
            .iter()
            .filter(|r| r.revoked)
            .map(|r| r.metadata_uri.clone())
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_input_order_is_irrelevant(
        (issued, shuffled) in issuances().prop_flat_map(|issued| {
            (Just(issued.clone()), Just(issued).prop_shuffle())
        })
    ) {
        prop_assert_eq!(assemble(issued, &[], clock()), assemble(shuffled, &[], clock()));
    }

    #[test]
    fn prop_newest_first(issued in issuances()) {
        let records = assemble(issued, &[], clock());
        prop_assert!(records.windows(2).all(|w| w[0].issued_at >= w[1].issued_at));
    }

    #[test]
    fn prop_last_issuer_event_wins(
        events in prop::collection::btree_set((0u64..200, 0u64..4), 1..30)
            .prop_flat_map(|positions| {
                let n = positions.len();
                (
                    Just(positions),
                    prop::collection::vec((0u8..4, any::<bool>()), n),
                )
            })
            .prop_map(|(positions, kinds)| {
                positions
                    .into_iter()
                    .zip(kinds)
                    .map(|((block, index), (byte, added))| IssuerEvent {
                        kind: if added { IssuerEventKind::Added } else { IssuerEventKind::Removed },
                        address: Address::repeat_byte(byte),
                        position: LogPosition::new(block, index),
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    ) {
        let mut latest: HashMap<Address, (LogPosition, bool)> = HashMap::new();
        for event in &events {
            let entry = latest
                .entry(event.address)
                .or_insert((event.position, event.kind.is_active()));
            if event.position >= entry.0 {
                *entry = (event.position, event.kind.is_active());
            }
        }

        let records = fold_issuer_events(events);
        prop_assert_eq!(records.len(), latest.len());
        for record in records {
            prop_assert_eq!(Some(record.is_active), latest.get(&record.address).map(|e| e.1));
        }
    }
}
