use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::{SemanticError, StoreError};

/// Errors surfaced by the query surface (ranking, workflow, catalog)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    /// Short machine-readable kind, used as the `error` field in responses
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::ExternalService(_) => "external_service_error",
            ServiceError::Timeout(_) => "timeout",
            ServiceError::Store(_) => "store_error",
        }
    }
}

/// Unique violations surface as conflicts; everything else is a store fault.
impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<SemanticError> for ServiceError {
    fn from(value: SemanticError) -> Self {
        ServiceError::ExternalService(value.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(value: validator::ValidationErrors) -> Self {
        ServiceError::Validation(value.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
