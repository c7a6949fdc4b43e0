use crate::domain::event::RawWebhook;
use crate::gateways::ProviderId;
use crate::webhooks::pipeline::PipelineError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let provider = ProviderId::new(provider);
    let signature = state
        .registry
        .create(&provider)
        .ok()
        .and_then(|adapter| {
            headers
                .get(adapter.signature_header())
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        });

    let raw = RawWebhook {
        provider,
        signature,
        body: body.to_vec(),
        received_at: chrono::Utc::now(),
    };

    match state.pipeline.ingest(raw).await {
        Ok(disposition) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"received": true, "outcome": disposition.label()})),
        )
            .into_response(),
        Err(PipelineError::Gateway(e)) => e.into_response(),
        Err(PipelineError::Retryable(_)) => (
            axum::http::StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "error": {
                    "code": "DISPATCH_UNAVAILABLE",
                    "message": "event accepted but not dispatched, please redeliver"
                }
            })),
        )
            .into_response(),
    }
}
