//! # VeriCred Indexer
//!
//! Rebuilds the certificate and issuer read models from contract event logs.
//!
//! Nothing is persisted: every query runs a full reconstruction pass over
//! the configured block range and returns freshly materialized records.
//!
//! ## Components
//!
//! - [`CertificateReconstructor`]: joins `CertificateIssued` events with
//!   block timestamps, metadata documents and `CertificateRevoked` events
//! - [`IssuerReconstructor`]: folds `IssuerAdded`/`IssuerRemoved` events in
//!   chain order into current memberships
//! - [`CertificateQuery`]: the caller-facing accessors used by the HTTP
//!   service and the CLI

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod certificates;
pub mod error;
pub mod issuers;
pub mod query;

pub use certificates::{assemble, CertificateReconstructor, CertificateSet, ResolvedIssuance, SkippedIssuance};
pub use error::{IndexerError, Result};
pub use issuers::{fold_issuer_events, IssuerReconstructor};
pub use query::{filter_by_holder, CertificateQuery};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::certificates::{CertificateReconstructor, CertificateSet};
    pub use crate::error::{IndexerError, Result};
    pub use crate::issuers::IssuerReconstructor;
    pub use crate::query::CertificateQuery;
}
