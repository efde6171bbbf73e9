//! Caller-facing query surface

use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{debug, info};

use vericred_chain::{CertificateContract, ChainClient, ChainLogReader, JsonRpcClient};
use vericred_core::{CertificateRecord, IndexerConfig, IssuerRecord, Role};
use vericred_ipfs::{CertificateFields, GatewayFetcher, MetadataFetcher, PinReceipt, PinataClient, PinningService};

use crate::certificates::{CertificateReconstructor, CertificateSet};
use crate::error::{IndexerError, Result};
use crate::issuers::IssuerReconstructor;

/// Keep the records whose holder equals `holder`, ignoring ASCII case
pub fn filter_by_holder(records: Vec<CertificateRecord>, holder: &str) -> Vec<CertificateRecord> {
    records
        .into_iter()
        .filter(|record| record.holder_matches(holder))
        .collect()
}

/// Read and pin operations over injected chain, metadata and pinning clients.
///
/// Holds no state between calls; every read runs a fresh reconstruction
/// pass. A missing contract address is reported on each call rather than at
/// construction, so a service can start and answer health checks before it
/// is fully configured.
#[derive(Clone)]
pub struct CertificateQuery {
    client: Arc<dyn ChainClient>,
    fetcher: Arc<dyn MetadataFetcher>,
    pinner: Arc<dyn PinningService>,
    config: IndexerConfig,
}

impl CertificateQuery {
    /// Assemble from explicit clients
    pub fn new(
        client: Arc<dyn ChainClient>,
        fetcher: Arc<dyn MetadataFetcher>,
        pinner: Arc<dyn PinningService>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            client,
            fetcher,
            pinner,
            config,
        }
    }

    /// Build JSON-RPC, gateway and Pinata clients from configuration
    pub fn from_config(config: IndexerConfig) -> Result<Self> {
        config.validate().map_err(IndexerError::Configuration)?;

        let client = JsonRpcClient::new(&config.chain)
            .map_err(|e| IndexerError::Configuration(e.to_string()))?;
        let fetcher = GatewayFetcher::new(&config.ipfs)
            .map_err(|e| IndexerError::Configuration(e.to_string()))?;
        let pinner = PinataClient::new(&config.ipfs)?;

        debug!("Query clients built for {}", client.url());
        Ok(Self::new(
            Arc::new(client),
            Arc::new(fetcher),
            Arc::new(pinner),
            config,
        ))
    }

    /// Active configuration
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    fn contract_address(&self) -> Result<Address> {
        Ok(self.config.chain.contract_address()?)
    }

    fn reader(&self) -> Result<ChainLogReader> {
        Ok(ChainLogReader::new(
            self.client.clone(),
            self.contract_address()?,
            self.config.chain.holder_encoding,
        ))
    }

    /// Full reconstruction pass, including the skipped issuances
    pub async fn reconstruct_certificates(&self) -> Result<CertificateSet> {
        CertificateReconstructor::new(
            self.reader()?,
            self.fetcher.clone(),
            self.config.reconstruction.clone(),
        )
        .reconstruct()
        .await
    }

    /// `getAllCertificates`
    pub async fn get_all_certificates(&self) -> Result<Vec<CertificateRecord>> {
        Ok(self.reconstruct_certificates().await?.records)
    }

    /// `getCertificates(holder)`; an unknown holder yields an empty list
    pub async fn get_certificates(&self, holder: &str) -> Result<Vec<CertificateRecord>> {
        let all = self.get_all_certificates().await?;
        let records = filter_by_holder(all, holder);
        debug!("{} certificates for holder {}", records.len(), holder);
        Ok(records)
    }

    /// `getIssuers`
    pub async fn get_issuers(&self) -> Result<Vec<IssuerRecord>> {
        IssuerReconstructor::new(self.reader()?, self.config.issuers.clone())
            .reconstruct()
            .await
    }

    /// Role of an account with respect to the contract
    pub async fn role_of(&self, account: Address) -> Result<Role> {
        let contract = CertificateContract::new(self.client.clone(), self.contract_address()?);
        contract
            .role_of(account)
            .await
            .map_err(IndexerError::Contract)
    }

    /// `pinCertificateData`
    pub async fn pin_certificate_data(&self, fields: &CertificateFields) -> Result<PinReceipt> {
        let receipt = self.pinner.pin(fields).await?;
        info!("Certificate metadata available at {}", receipt.metadata_uri());
        Ok(receipt)
    }
}
