use crate::config::ConfigStore;
use crate::error::GatewayError;
use crate::gateways::{GatewayDescriptor, PaymentGateway, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub struct GatewayRegistry {
    adapters: HashMap<ProviderId, Arc<dyn PaymentGateway>>,
    config: Arc<dyn ConfigStore>,
    enablement: RwLock<HashMap<ProviderId, (Instant, bool)>>,
    ttl: Duration,
}

impl GatewayRegistry {
    pub fn new(
        adapters: Vec<Arc<dyn PaymentGateway>>,
        config: Arc<dyn ConfigStore>,
        ttl: Duration,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.provider(), adapter))
            .collect();
        Self {
            adapters,
            config,
            enablement: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn create(&self, provider: &ProviderId) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.adapters
            .get(provider)
            .cloned()
            .ok_or_else(|| GatewayError::UnsupportedGateway(provider.clone()))
    }

    pub fn is_supported(&self, provider: &ProviderId) -> bool {
        self.adapters.contains_key(provider)
    }

    pub async fn is_enabled(&self, provider: &ProviderId) -> bool {
        {
            let cache = self.enablement.read().await;
            if let Some((loaded_at, enabled)) = cache.get(provider) {
                if loaded_at.elapsed() < self.ttl {
                    return *enabled;
                }
            }
        }

        let enabled = match self.adapters.get(provider) {
            Some(adapter) => {
                let flag = self
                    .config
                    .gateway_config(provider)
                    .map(|c| c.enabled)
                    .unwrap_or(false);
                flag && adapter.is_configured()
            }
            None => false,
        };

        let mut cache = self.enablement.write().await;
        cache.insert(provider.clone(), (Instant::now(), enabled));
        enabled
    }

    pub async fn list_available(&self) -> Vec<GatewayDescriptor> {
        let mut descriptors = Vec::with_capacity(self.adapters.len());
        for (provider, adapter) in &self.adapters {
            descriptors.push(GatewayDescriptor {
                provider: provider.clone(),
                display_name: adapter.display_name().to_string(),
                enabled: self.is_enabled(provider).await,
            });
        }
        descriptors.sort_by(|a, b| a.provider.as_str().cmp(b.provider.as_str()));
        descriptors
    }

    pub async fn list_enabled(&self) -> Vec<GatewayDescriptor> {
        self.list_available()
            .await
            .into_iter()
            .filter(|d| d.enabled)
            .collect()
    }
}
