//! # VeriCred IPFS
//!
//! Off-chain side of a certificate: the JSON metadata document addressed by
//! an `ipfs://` URI.
//!
//! - [`GatewayFetcher`] resolves metadata through an HTTP gateway. It never
//!   returns an error; every failure becomes a tagged [`MetadataOutcome`] so
//!   one bad pointer cannot block a whole reconstruction pass.
//! - [`PinataClient`] pins a new certificate document and returns its CID.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod fetcher;
pub mod pinning;
pub mod uri;

pub use error::{MetadataError, PinningError};
pub use fetcher::{GatewayFetcher, MetadataFetcher, MetadataOutcome};
pub use pinning::{CertificateFields, PinReceipt, PinataClient, PinningService};
pub use uri::ContentUri;

/// URI scheme of content-addressed metadata
pub const IPFS_SCHEME: &str = "ipfs://";
