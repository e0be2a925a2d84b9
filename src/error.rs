//! Error types for the registry service
//!
//! Provides unified error handling using thiserror. Every variant renders as
//! the JSON envelope `{"error": true, "message": ...}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::{ErrorResponse, FieldError};
use crate::resilience::{CircuitError, CircuitOpen};
use crate::store::StoreError;

// == App Error Enum ==
/// Unified error type for the service and HTTP layers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: &'static str, id: Uuid },

    /// Uniqueness conflict, e.g. a duplicate investor email
    #[error("{0}")]
    Conflict(String),

    /// Well-formed request that breaks a domain rule
    #[error("{0}")]
    BusinessRule(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    /// Circuit breaker is open; the store was not called
    #[error(transparent)]
    ServiceUnavailable(#[from] CircuitOpen),

    /// The store itself failed with an infrastructure error
    #[error("data store unavailable: {0}")]
    Dependency(#[source] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn validation(details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: "Validation failed".to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BusinessRule(_) | AppError::Validation { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ServiceUnavailable(_) | AppError::Dependency(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == Conversions ==
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(msg) => {
                AppError::Conflict(format!("Record already exists ({})", msg))
            }
            StoreError::ForeignKeyViolation(msg) | StoreError::CheckViolation(msg) => {
                AppError::BusinessRule(format!("Database constraint violated: {}", msg))
            }
            err @ (StoreError::Connection(_) | StoreError::Timeout(_)) => AppError::Dependency(err),
        }
    }
}

impl From<CircuitError<StoreError>> for AppError {
    fn from(err: CircuitError<StoreError>) -> Self {
        match err {
            CircuitError::Open(open) => AppError::ServiceUnavailable(open),
            CircuitError::Inner(inner) => inner.into(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AppError::Validation { message, details } => {
                ErrorResponse::new(message.clone()).with_details(details.clone())
            }
            AppError::Dependency(source) => {
                error!(error = %source, "data store call failed");
                ErrorResponse::new("The data store is temporarily unavailable. Please retry shortly.")
            }
            AppError::Internal(detail) => {
                error!(error = %detail, "unhandled internal error");
                ErrorResponse::new("An unexpected internal error occurred.")
            }
            AppError::ServiceUnavailable(open) => {
                warn!(circuit = %open.name, retry_after = ?open.retry_after, "request rejected by open circuit");
                ErrorResponse::new(self.to_string())
            }
            _ => ErrorResponse::new(self.to_string()),
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::ServiceUnavailable(open) = &self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(open.retry_after_secs()),
            );
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the registry service.
pub type Result<T> = std::result::Result<T, AppError>;
