use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failures while building the canonical signed string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signed field list is empty")]
    EmptyFieldList,

    #[error("signed field list has an empty name at position {0}")]
    EmptyFieldName(usize),

    #[error("signed field listed more than once: {0}")]
    DuplicateField(String),

    #[error("signed field missing from record: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Signature does not match record")]
    InvalidSignature,

    #[error("Invalid API credentials")]
    Unauthorized,

    #[error("Payment gateway timed out: {0}")]
    GatewayTimeout(String),

    #[error("Payment gateway request failed: {0}")]
    Gateway(#[from] reqwest::Error),

    #[error("Payment gateway rejected request with status {status}")]
    GatewayStatus { status: u16 },

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

impl RelayError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            RelayError::Signing(SigningError::MissingField(_)) => {
                (StatusCode::BAD_REQUEST, "MISSING_SIGNED_FIELD")
            }
            RelayError::Signing(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNED_FIELDS"),
            RelayError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            RelayError::InvalidField { .. } => (StatusCode::BAD_REQUEST, "INVALID_FIELD"),
            RelayError::InvalidSignature => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            RelayError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            RelayError::GatewayTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
            RelayError::Gateway(_) | RelayError::GatewayStatus { .. } => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            RelayError::InternalError(_) | RelayError::AnyhowError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// Message safe to hand back to the caller. Server-side causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::GatewayTimeout(_) => "Payment gateway timed out".to_string(),
            RelayError::Gateway(_) | RelayError::GatewayStatus { .. } => {
                "Payment gateway unavailable".to_string()
            }
            RelayError::InternalError(_) | RelayError::AnyhowError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(
                error = ?self,
                error_code = error_code,
                request_id = %request_id,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error = %self,
                error_code = error_code,
                request_id = %request_id,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}
