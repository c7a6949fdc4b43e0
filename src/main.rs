use axum::routing::{get, post};
use axum::Router;
use payment_hub::config::{AppConfig, ConfigStore, EnvConfigStore};
use payment_hub::gateways::payu::PayuGateway;
use payment_hub::gateways::registry::GatewayRegistry;
use payment_hub::gateways::stripe::StripeGateway;
use payment_hub::gateways::{GatewayConfig, PaymentGateway, ProviderId};
use payment_hub::webhooks::dedup::InMemoryDedupStore;
use payment_hub::webhooks::pipeline::WebhookPipeline;
use payment_hub::webhooks::sink::HttpEventSink;
use payment_hub::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let config_store: Arc<dyn ConfigStore> = Arc::new(EnvConfigStore);

    let gateway_config = |id: &str| {
        let provider = ProviderId::new(id);
        config_store
            .gateway_config(&provider)
            .unwrap_or_else(|| GatewayConfig::disabled(provider))
    };

    let stripe = Arc::new(StripeGateway::new(
        gateway_config("stripe"),
        std::env::var("STRIPE_BASE_URL").unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        cfg.gateway_timeout_ms,
    ));
    let payu = Arc::new(PayuGateway::new(
        gateway_config("payu"),
        std::env::var("PAYU_BASE_URL").unwrap_or_else(|_| "https://api.payu.example".to_string()),
        cfg.gateway_timeout_ms,
    ));
    let adapters: Vec<Arc<dyn PaymentGateway>> = vec![stripe, payu];

    let registry = Arc::new(GatewayRegistry::new(
        adapters,
        config_store,
        Duration::from_secs(cfg.enablement_ttl_secs),
    ));

    let pipeline = WebhookPipeline {
        registry: registry.clone(),
        dedup: Arc::new(InMemoryDedupStore::new()),
        sink: Arc::new(HttpEventSink {
            target_url: cfg.orchestrator_url.clone(),
            client: reqwest::Client::new(),
        }),
    };

    let state = AppState { registry, pipeline };

    let app = Router::new()
        .route("/health", get(payment_hub::http::handlers::payments::health))
        .route(
            "/payments",
            post(payment_hub::http::handlers::payments::create_payment),
        )
        .route(
            "/payments/:provider/:intent_id",
            get(payment_hub::http::handlers::payments::get_payment),
        )
        .route(
            "/payments/:provider/:intent_id/confirm",
            post(payment_hub::http::handlers::payments::confirm_payment),
        )
        .route(
            "/payments/:provider/:intent_id/refunds",
            post(payment_hub::http::handlers::payments::refund_payment),
        )
        .route(
            "/gateways",
            get(payment_hub::http::handlers::gateways::list_gateways),
        )
        .route(
            "/gateways/enabled",
            get(payment_hub::http::handlers::gateways::list_enabled_gateways),
        )
        .route(
            "/gateways/:provider/config",
            get(payment_hub::http::handlers::gateways::get_gateway_config),
        )
        .route(
            "/webhooks/:provider",
            post(payment_hub::http::handlers::webhooks::receive_webhook),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
