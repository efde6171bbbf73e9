//! Read-only calls against the certificate contract

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use std::sync::Arc;
use tracing::debug;

use vericred_core::Role;

use crate::abi::ICertificateRegistry::{isIssuerCall, ownerCall};
use crate::client::ChainClient;
use crate::error::{DecodeError, Result};

/// View functions of the deployed certificate contract
#[derive(Clone)]
pub struct CertificateContract {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl CertificateContract {
    /// Bind to a deployed contract
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    async fn view<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let out = self
            .client
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        C::abi_decode_returns(&out, true).map_err(|e| DecodeError::from(e).into())
    }

    /// `owner()`
    pub async fn owner(&self) -> Result<Address> {
        Ok(self.view(ownerCall {}).await?._0)
    }

    /// `isIssuer(address)`
    pub async fn is_issuer(&self, account: Address) -> Result<bool> {
        Ok(self.view(isIssuerCall { account }).await?._0)
    }

    /// Role of an account: owner first, then issuer, otherwise viewer
    pub async fn role_of(&self, account: Address) -> Result<Role> {
        let (owner, is_issuer) = tokio::try_join!(self.owner(), self.is_issuer(account))?;

        let role = if owner == account {
            Role::Owner
        } else if is_issuer {
            Role::Issuer
        } else {
            Role::Viewer
        };
        debug!("Resolved role of {} as {}", account, role);
        Ok(role)
    }
}
