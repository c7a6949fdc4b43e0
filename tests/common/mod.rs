#![allow(dead_code)]

use async_trait::async_trait;
use payment_hub::config::StaticConfigStore;
use payment_hub::domain::event::{NormalizedEvent, RawWebhook};
use payment_hub::gateways::mock::MockGateway;
use payment_hub::gateways::registry::GatewayRegistry;
use payment_hub::gateways::{hmac_sha256_hex, GatewayConfig, PaymentGateway, ProviderId};
use payment_hub::webhooks::dedup::InMemoryDedupStore;
use payment_hub::webhooks::pipeline::WebhookPipeline;
use payment_hub::webhooks::sink::EventSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const WEBHOOK_SECRET: &str = "whsec_test_123";

pub fn mock_provider() -> ProviderId {
    ProviderId::new("mock")
}

pub fn mock_config(enabled: bool) -> GatewayConfig {
    GatewayConfig {
        provider: mock_provider(),
        api_key: "mk_test_key".to_string(),
        api_secret: "mk_test_secret".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        enabled,
        supported_currencies: ["USD", "EUR", "COP"].iter().map(|c| c.to_string()).collect(),
    }
}

pub fn sign(secret: &str, body: &[u8]) -> String {
    hmac_sha256_hex(secret, body).unwrap()
}

pub fn signed_webhook(body: Vec<u8>) -> RawWebhook {
    RawWebhook {
        provider: mock_provider(),
        signature: Some(sign(WEBHOOK_SECRET, &body)),
        body,
        received_at: chrono::Utc::now(),
    }
}

pub fn status_event(event_id: &str, event_type: &str, intent_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": event_id,
        "type": event_type,
        "data": { "intent_id": intent_id, "amount_minor": 5000 }
    })
    .to_string()
    .into_bytes()
}

pub struct RecordingSink {
    pub events: tokio::sync::Mutex<Vec<NormalizedEvent>>,
    pub fail_next: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: tokio::sync::Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        })
    }

    pub async fn dispatched(&self) -> Vec<NormalizedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn dispatch(&self, event: &NormalizedEvent) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("orchestrator unavailable");
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

pub fn mock_pipeline() -> (WebhookPipeline, Arc<RecordingSink>) {
    let store = Arc::new(StaticConfigStore::new().with(mock_config(true)));
    let adapter: Arc<dyn PaymentGateway> = Arc::new(MockGateway::new(mock_config(true)));
    let registry = Arc::new(GatewayRegistry::new(
        vec![adapter],
        store,
        Duration::from_secs(30),
    ));
    let sink = RecordingSink::new();
    let pipeline = WebhookPipeline {
        registry,
        dedup: Arc::new(InMemoryDedupStore::new()),
        sink: sink.clone(),
    };
    (pipeline, sink)
}
