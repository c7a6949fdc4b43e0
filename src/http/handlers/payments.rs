use crate::error::GatewayError;
use crate::gateways::{CreateIntentRequest, ProviderId, RefundRequest};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    pub provider: String,
    pub amount_minor: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RefundBody {
    #[serde(default)]
    pub amount_minor: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreatePaymentBody>,
) -> impl IntoResponse {
    let provider = ProviderId::new(body.provider);
    let adapter = match state.registry.create(&provider) {
        Ok(adapter) => adapter,
        Err(e) => return e.into_response(),
    };
    if !state.registry.is_enabled(&provider).await {
        return GatewayError::Configuration(format!("{provider} is disabled")).into_response();
    }

    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let req = CreateIntentRequest {
        amount_minor: body.amount_minor,
        currency: body.currency,
        metadata: body.metadata,
        idempotency_key,
    };

    match adapter.create_payment_intent(req).await {
        Ok(intent) => (axum::http::StatusCode::CREATED, Json(intent)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path((provider, intent_id)): Path<(String, String)>,
    extra: Option<Json<serde_json::Value>>,
) -> impl IntoResponse {
    let adapter = match state.registry.create(&ProviderId::new(provider)) {
        Ok(adapter) => adapter,
        Err(e) => return e.into_response(),
    };
    match adapter
        .confirm_payment(&intent_id, extra.map(|Json(v)| v))
        .await
    {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path((provider, intent_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let adapter = match state.registry.create(&ProviderId::new(provider)) {
        Ok(adapter) => adapter,
        Err(e) => return e.into_response(),
    };
    match adapter.get_payment_status(&intent_id).await {
        Ok(intent) => (axum::http::StatusCode::OK, Json(intent)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Path((provider, intent_id)): Path<(String, String)>,
    Json(body): Json<RefundBody>,
) -> impl IntoResponse {
    let adapter = match state.registry.create(&ProviderId::new(provider)) {
        Ok(adapter) => adapter,
        Err(e) => return e.into_response(),
    };
    let req = RefundRequest {
        intent_id,
        amount_minor: body.amount_minor,
        reason: body.reason,
    };
    match adapter.refund_payment(req).await {
        Ok(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
