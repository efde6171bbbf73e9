//! # VeriCred Chain
//!
//! Read-only access to the certificate contract through a JSON-RPC node.
//!
//! ## Features
//!
//! - **Log Queries**: `CertificateIssued`, `CertificateRevoked`,
//!   `IssuerAdded` and `IssuerRemoved` over a block range
//! - **ABI Decoding**: `sol!` bindings for event data, topics and
//!   `issueCertificate` call data
//! - **Contract Reads**: `owner()` and `isIssuer(address)`
//! - **Pluggable Transport**: everything goes through the [`ChainClient`]
//!   trait so reconstruction can run against test doubles

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod abi;
pub mod client;
pub mod contract;
pub mod error;
pub mod events;
pub mod reader;
pub mod rpc;

pub use abi::{ICertificateRegistry, ICertificateRegistryHashed};
pub use client::{log_position, BlockHeader, BlockId, ChainClient, Log, LogFilter, Transaction};
pub use contract::CertificateContract;
pub use error::{ChainError, DecodeError, Result};
pub use events::{CertificateEvent, HolderField, IssuerEvent, IssuerEventKind};
pub use reader::{CertificateLogs, ChainLogReader, DecodedLogs, RejectedLog};
pub use rpc::JsonRpcClient;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{ChainClient, Log, LogFilter};
    pub use crate::error::{ChainError, Result};
    pub use crate::events::{CertificateEvent, IssuerEvent, IssuerEventKind};
    pub use crate::reader::ChainLogReader;
    pub use crate::rpc::JsonRpcClient;
}
