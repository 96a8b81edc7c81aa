use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::HashMap;

use crate::gateway::GatewayKind;

/// The error taxonomy for the webhook verification pipeline.
///
/// Every step of the pipeline maps to exactly one of these kinds; the first
/// failing step short-circuits the rest and nothing is persisted. All
/// failures are surfaced to the calling gateway as structured responses,
/// never retried locally (gateways redeliver on their own schedule).
#[derive(Debug, thiserror::Error)]
pub enum KassaflowError {
    #[error("Gateway not found")]
    GatewayNotFound,

    #[error("Validation failed")]
    Validation {
        field_errors: HashMap<String, Vec<String>>,
    },

    #[error("Wrong sign")]
    SignatureMismatch,

    #[error("Merchant ID not found")]
    MerchantMismatch,

    #[error("Payment {0} not found")]
    PaymentNotFound(i64),

    #[error("Wrong payment amount")]
    AmountMismatch,

    #[error("Status not found: {0}")]
    UnknownStatus(String),

    #[error("Too many requests for gateway {0}")]
    RateLimited(GatewayKind),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl KassaflowError {
    /// Build a validation error from collected per-field messages.
    pub fn validation(field_errors: HashMap<String, Vec<String>>) -> Self {
        Self::Validation { field_errors }
    }

    /// Build a validation error for a single field.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), vec![message.into()]);
        Self::Validation { field_errors }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::GatewayNotFound
            | Self::Validation { .. }
            | Self::MerchantMismatch
            | Self::AmountMismatch
            | Self::UnknownStatus(_) => StatusCode::BAD_REQUEST,
            Self::SignatureMismatch => StatusCode::FORBIDDEN,
            Self::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to expose to the caller.
    ///
    /// Client errors carry their real message; internal errors are replaced
    /// with a generic one and only logged server-side.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::RateLimited(_) => "Too Many Requests".to_string(),
            other => other.to_string(),
        }
    }
}

/// Standard error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    message: String,
    error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for KassaflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        let field_errors = match &self {
            Self::Validation { field_errors } => Some(field_errors.clone()),
            _ => None,
        };

        // Full error detail stays in the server logs.
        tracing::warn!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Webhook rejected"
        );

        let body = Json(ErrorResponse {
            message: self.safe_message(),
            error_id,
            field_errors,
        });

        (status, body).into_response()
    }
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, KassaflowError>;
