use crate::gateways::ProviderId;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown payment provider: {0}")]
    UnsupportedGateway(ProviderId),
    #[error("provider is not configured: {0}")]
    Configuration(String),
    #[error("currency {currency} is not supported by {provider}")]
    UnsupportedCurrency { provider: ProviderId, currency: String },
    #[error("amount must be a positive minor-unit value, got {0}")]
    InvalidAmount(i64),
    #[error("webhook signature verification failed")]
    SignatureVerification,
    #[error("provider communication failed: {0}")]
    Communication(String),
    #[error("payment declined: {code}")]
    PaymentDeclined { code: String, message: String },
    #[error("refund of {requested} exceeds refundable balance of {refundable}")]
    InvalidRefundAmount { requested: i64, refundable: i64 },
    #[error("no such payment: {0}")]
    NotFound(String),
    #[error("unprocessable webhook payload: {0}")]
    InvalidWebhook(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::UnsupportedGateway(_) => "UNSUPPORTED_GATEWAY",
            GatewayError::Configuration(_) => "CONFIGURATION_ERROR",
            GatewayError::UnsupportedCurrency { .. } => "UNSUPPORTED_CURRENCY",
            GatewayError::InvalidAmount(_) => "INVALID_AMOUNT",
            GatewayError::SignatureVerification => "SIGNATURE_VERIFICATION_FAILED",
            GatewayError::Communication(_) => "GATEWAY_COMMUNICATION_ERROR",
            GatewayError::PaymentDeclined { .. } => "PAYMENT_DECLINED",
            GatewayError::InvalidRefundAmount { .. } => "INVALID_REFUND_AMOUNT",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::InvalidWebhook(_) => "INVALID_WEBHOOK",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::UnsupportedGateway(_) => StatusCode::NOT_FOUND,
            GatewayError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UnsupportedCurrency { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::SignatureVerification => StatusCode::UNAUTHORIZED,
            GatewayError::Communication(_) => StatusCode::BAD_GATEWAY,
            GatewayError::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
            GatewayError::InvalidRefundAmount { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Communication(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Communication("provider request timed out".to_string())
        } else if e.is_connect() {
            GatewayError::Communication("provider is unreachable".to_string())
        } else {
            GatewayError::Communication(e.without_url().to_string())
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self.envelope())).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}
