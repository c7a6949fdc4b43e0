use crate::domain::event::RawWebhook;
use crate::error::GatewayError;
use crate::gateways::registry::GatewayRegistry;
use crate::webhooks::dedup::DedupStore;
use crate::webhooks::sink::EventSink;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    Dispatched,
    AlreadyProcessed,
    Ignored,
}

impl WebhookDisposition {
    pub fn label(self) -> &'static str {
        match self {
            WebhookDisposition::Dispatched => "dispatched",
            WebhookDisposition::AlreadyProcessed => "already_processed",
            WebhookDisposition::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("event accepted but not dispatched: {0}")]
    Retryable(String),
}

#[derive(Clone)]
pub struct WebhookPipeline {
    pub registry: Arc<GatewayRegistry>,
    pub dedup: Arc<dyn DedupStore>,
    pub sink: Arc<dyn EventSink>,
}

impl WebhookPipeline {
    pub async fn ingest(&self, raw: RawWebhook) -> Result<WebhookDisposition, PipelineError> {
        let adapter = self.registry.create(&raw.provider)?;

        if !adapter.verify_webhook_signature(&raw) {
            tracing::warn!(provider = %raw.provider, "webhook signature verification failed");
            return Err(GatewayError::SignatureVerification.into());
        }

        let event = match adapter.process_webhook(&raw.body, raw.received_at) {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::debug!(provider = %raw.provider, "webhook event type intentionally ignored");
                return Ok(WebhookDisposition::Ignored);
            }
            Err(GatewayError::InvalidWebhook(reason)) => {
                tracing::warn!(provider = %raw.provider, %reason, "unprocessable webhook acknowledged without action");
                return Ok(WebhookDisposition::Ignored);
            }
            Err(other) => return Err(other.into()),
        };

        let key = (event.provider.clone(), event.event_id.clone());
        if !self.dedup.try_mark(&key).await {
            tracing::debug!(
                provider = %raw.provider,
                event_id = %event.event_id,
                "duplicate webhook delivery acknowledged"
            );
            return Ok(WebhookDisposition::AlreadyProcessed);
        }

        match self.sink.dispatch(&event).await {
            Ok(()) => {
                tracing::info!(
                    provider = %raw.provider,
                    event_id = %event.event_id,
                    intent_id = %event.intent_id,
                    event_type = event.event_type(),
                    "webhook event dispatched"
                );
                Ok(WebhookDisposition::Dispatched)
            }
            Err(e) => {
                self.dedup.unmark(&key).await;
                tracing::warn!(
                    provider = %raw.provider,
                    event_id = %event.event_id,
                    error = %e,
                    "dispatch failed, requesting provider redelivery"
                );
                Err(PipelineError::Retryable(e.to_string()))
            }
        }
    }
}
