use crate::domain::event::NormalizedEvent;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn dispatch(&self, event: &NormalizedEvent) -> Result<()>;
}

pub struct HttpEventSink {
    pub target_url: String,
    pub client: reqwest::Client,
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn dispatch(&self, event: &NormalizedEvent) -> Result<()> {
        let resp = self
            .client
            .post(&self.target_url)
            .header("Content-Type", "application/json")
            .header("X-Event-Type", event.event_type())
            .header("X-Provider-Id", event.provider.as_str())
            .json(event)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("orchestrator returned HTTP {}", resp.status().as_u16());
        }
        Ok(())
    }
}
