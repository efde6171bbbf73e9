//! REST API handlers for the Certificate Service

use actix_web::{web, HttpResponse, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use vericred_core::Role;
use vericred_ipfs::CertificateFields;

use crate::error::ServiceError;
use crate::AppState;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .route("/certificates", web::get().to(list_certificates))
            .route("/certificates/{holder}", web::get().to(holder_certificates))
            .route("/issuers", web::get().to(list_issuers))
            .route("/roles/{address}", web::get().to(get_role))
            .route("/pins", web::post().to(pin_certificate)),
    );
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    contract_configured: bool,
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "certificate-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        contract_configured: state.query.config().chain.contract_address.is_some(),
    })
}

/// All certificates, newest first
async fn list_certificates(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let records = state.query.get_all_certificates().await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Certificates of one holder; unknown holders get an empty list
async fn holder_certificates(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let holder = path.into_inner();
    if holder.trim().is_empty() {
        return Err(ServiceError::BadRequest("holder must not be empty".to_string()));
    }
    let records = state.query.get_certificates(&holder).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Issuer memberships
async fn list_issuers(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let issuers = state.query.get_issuers().await?;
    Ok(HttpResponse::Ok().json(issuers))
}

/// Role response
#[derive(Serialize)]
struct RoleResponse {
    address: Address,
    role: Role,
}

/// Role of an account
async fn get_role(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let raw = path.into_inner();
    let address: Address = raw
        .trim()
        .parse()
        .map_err(|_| ServiceError::BadRequest(format!("invalid address: {}", raw)))?;

    let role = state.query.role_of(address).await?;
    Ok(HttpResponse::Ok().json(RoleResponse { address, role }))
}

/// Pin request body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinRequest {
    recipient_name: String,
    recipient_email: String,
    certificate_title: String,
    certificate_description: String,
}

/// Pin response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinResponse {
    id: String,
    size: u64,
    timestamp: String,
    metadata_uri: String,
}

/// Pin a new certificate document
async fn pin_certificate(
    state: web::Data<AppState>,
    body: web::Json<PinRequest>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    for (field, value) in [
        ("recipientName", &body.recipient_name),
        ("certificateTitle", &body.certificate_title),
    ] {
        if value.trim().is_empty() {
            return Err(ServiceError::BadRequest(format!("{} must not be empty", field)));
        }
    }

    let fields = CertificateFields {
        recipient_name: body.recipient_name,
        recipient_email: body.recipient_email,
        certificate_title: body.certificate_title,
        certificate_description: body.certificate_description,
    };
    info!("Pinning certificate: {}", fields.certificate_title);

    let receipt = state.query.pin_certificate_data(&fields).await?;
    Ok(HttpResponse::Created().json(PinResponse {
        metadata_uri: receipt.metadata_uri(),
        id: receipt.id,
        size: receipt.size,
        timestamp: receipt.timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use alloy_primitives::Bytes;
    use async_trait::async_trait;
    use std::sync::Arc;
    use vericred_chain::{BlockHeader, BlockId, ChainClient, Log, LogFilter, Transaction};
    use vericred_core::{IndexerConfig, TxHash};
    use vericred_indexer::CertificateQuery;
    use vericred_ipfs::{MetadataFetcher, MetadataOutcome, PinReceipt, PinningError, PinningService};

    struct EmptyChain;

    #[async_trait]
    impl ChainClient for EmptyChain {
        async fn block_number(&self) -> vericred_chain::Result<u64> {
            Ok(0)
        }

        async fn get_logs(&self, _filter: &LogFilter) -> vericred_chain::Result<Vec<Log>> {
            Ok(Vec::new())
        }

        async fn get_block(&self, _id: BlockId) -> vericred_chain::Result<Option<BlockHeader>> {
            Ok(None)
        }

        async fn get_transaction(&self, _hash: TxHash) -> vericred_chain::Result<Option<Transaction>> {
            Ok(None)
        }

        async fn call(&self, _to: Address, _data: Bytes) -> vericred_chain::Result<Bytes> {
            Err(vericred_chain::ChainError::Transport("connection refused".into()))
        }
    }

    struct NoMetadata;

    #[async_trait]
    impl MetadataFetcher for NoMetadata {
        async fn fetch(&self, _uri: &str) -> MetadataOutcome {
            MetadataOutcome::Failed {
                reason: "offline".into(),
            }
        }
    }

    struct Pinner {
        configured: bool,
    }

    #[async_trait]
    impl PinningService for Pinner {
        async fn pin(&self, _fields: &CertificateFields) -> std::result::Result<PinReceipt, PinningError> {
            if !self.configured {
                return Err(PinningError::MissingCredentials);
            }
            Ok(PinReceipt {
                id: "QmPinned".into(),
                size: 42,
                timestamp: "2024-03-01T12:00:00.000Z".into(),
            })
        }
    }

    fn state(contract: Option<Address>, pinning: bool) -> web::Data<AppState> {
        let mut config = IndexerConfig::default();
        config.chain.contract_address = contract;
        web::Data::new(AppState {
            query: CertificateQuery::new(
                Arc::new(EmptyChain),
                Arc::new(NoMetadata),
                Arc::new(Pinner { configured: pinning }),
                config,
            ),
        })
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new()
                .app_data(state(None, false))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["contract_configured"], false);
    }

    #[actix_web::test]
    async fn test_empty_list_is_ok() {
        let app = test::init_service(
            App::new()
                .app_data(state(Some(Address::repeat_byte(0xcc)), false))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v1/certificates/0xab12")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn test_missing_contract_is_unavailable() {
        let app = test::init_service(
            App::new()
                .app_data(state(None, false))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/v1/certificates").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_configured");
    }

    #[actix_web::test]
    async fn test_role_lookup() {
        let app = test::init_service(
            App::new()
                .app_data(state(Some(Address::repeat_byte(0xcc)), false))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/roles/not-an-address").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let uri = format!("/api/v1/roles/{}", Address::repeat_byte(0x11));
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    fn pin_body(title: &str) -> serde_json::Value {
        serde_json::json!({
            "recipientName": "Ada Lovelace",
            "recipientEmail": "ada@example.com",
            "certificateTitle": title,
            "certificateDescription": "Completed"
        })
    }

    #[actix_web::test]
    async fn test_pin() {
        let app = test::init_service(
            App::new()
                .app_data(state(None, true))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/pins")
            .set_json(pin_body("Rust Systems"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], "QmPinned");
        assert_eq!(body["metadataUri"], "ipfs://QmPinned");

        let req = test::TestRequest::post()
            .uri("/api/v1/pins")
            .set_json(pin_body("  "))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_pin_without_credentials() {
        let app = test::init_service(
            App::new()
                .app_data(state(None, false))
                .configure(configure_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/pins")
            .set_json(pin_body("Rust Systems"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
