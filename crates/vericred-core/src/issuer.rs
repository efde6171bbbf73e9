//! Issuer membership records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Address;

/// Current membership of an account in the contract's issuer set
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRecord {
    /// Issuer account
    pub address: Address,
    /// Effect of the chronologically last add/remove event
    pub is_active: bool,
}

/// Role of an account with respect to the certificate contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Contract owner; manages issuers
    Owner,
    /// Authorized issuer; mints certificates
    Issuer,
    /// Anyone else; may hold and verify certificates
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("owner"),
            Self::Issuer => f.write_str("issuer"),
            Self::Viewer => f.write_str("viewer"),
        }
    }
}
