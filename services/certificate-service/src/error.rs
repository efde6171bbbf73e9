//! Error types for the Certificate Service

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use vericred_indexer::IndexerError;

/// Service-specific errors
#[derive(Debug)]
pub enum ServiceError {
    /// Query or pin failed
    Indexer(IndexerError),
    /// Request input rejected
    BadRequest(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexer(err) => write!(f, "{}", err),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<IndexerError> for ServiceError {
    fn from(err: IndexerError) -> Self {
        Self::Indexer(err)
    }
}

impl ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Indexer(err) if err.is_configuration() => "not_configured",
            Self::Indexer(_) => "upstream_unavailable",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Indexer(err) if err.is_configuration() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Indexer(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string()
        }))
    }
}
