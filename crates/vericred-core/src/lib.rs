//! # VeriCred Core
//!
//! Shared data model for the VeriCred certificate indexer.
//!
//! Certificates and issuer memberships are never stored: they are rebuilt
//! from contract event logs on every query. This crate holds the materialized
//! record types produced by a reconstruction pass, the configuration shared
//! by the indexer, service and CLI, and the common error type.
//!
//! ## Records
//!
//! - [`CertificateRecord`]: one `CertificateIssued` event joined with its
//!   block timestamp, off-chain metadata and revocation status
//! - [`IssuerRecord`]: the current membership of one issuer account

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod certificate;
pub mod config;
pub mod error;
pub mod issuer;
pub mod types;

pub use certificate::{CertificateMetadata, CertificateRecord, MetadataStatus, TimestampSource};
pub use config::{
    ChainConfig, HolderEncoding, IndexerConfig, IpfsConfig, IssuerConfig, PinningCredentials,
    ReconstructionConfig, RetryConfig,
};
pub use error::{Error, Result};
pub use issuer::{IssuerRecord, Role};
pub use types::{Address, BlockTag, LogPosition, TxHash};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::certificate::{CertificateMetadata, CertificateRecord};
    pub use crate::config::IndexerConfig;
    pub use crate::error::{Error, Result};
    pub use crate::issuer::IssuerRecord;
    pub use crate::types::{Address, BlockTag, LogPosition, TxHash};
}
