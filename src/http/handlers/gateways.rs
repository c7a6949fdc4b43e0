use crate::gateways::ProviderId;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

pub async fn list_gateways(State(state): State<AppState>) -> impl IntoResponse {
    let descriptors = state.registry.list_available().await;
    (axum::http::StatusCode::OK, Json(descriptors)).into_response()
}

pub async fn list_enabled_gateways(State(state): State<AppState>) -> impl IntoResponse {
    let descriptors = state.registry.list_enabled().await;
    (axum::http::StatusCode::OK, Json(descriptors)).into_response()
}

pub async fn get_gateway_config(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> impl IntoResponse {
    match state.registry.create(&ProviderId::new(provider)) {
        Ok(adapter) => {
            (axum::http::StatusCode::OK, Json(adapter.sanitized_config())).into_response()
        }
        Err(e) => e.into_response(),
    }
}
