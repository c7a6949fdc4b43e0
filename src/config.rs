use crate::gateways::{GatewayConfig, ProviderId};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub orchestrator_url: String,
    pub gateway_timeout_ms: u64,
    pub enablement_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            orchestrator_url: std::env::var("ORCHESTRATOR_URL")
                .unwrap_or_else(|_| "http://localhost:4000/payment-events".to_string()),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(2500),
            enablement_ttl_secs: std::env::var("ENABLEMENT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30),
        }
    }
}

pub trait ConfigStore: Send + Sync {
    fn gateway_config(&self, provider: &ProviderId) -> Option<GatewayConfig>;
}

pub struct EnvConfigStore;

impl ConfigStore for EnvConfigStore {
    fn gateway_config(&self, provider: &ProviderId) -> Option<GatewayConfig> {
        let prefix = format!("PAYMENTS_{}", provider.as_str().to_uppercase());
        let var = |key: &str| std::env::var(format!("{prefix}_{key}")).ok();

        let supported_currencies: HashSet<String> = var("CURRENCIES")
            .map(|v| {
                v.split(',')
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(GatewayConfig {
            provider: provider.clone(),
            api_key: var("API_KEY").unwrap_or_default(),
            api_secret: var("API_SECRET").unwrap_or_default(),
            webhook_secret: var("WEBHOOK_SECRET").unwrap_or_default(),
            enabled: var("ENABLED").map(|v| v == "true" || v == "1").unwrap_or(false),
            supported_currencies,
        })
    }
}

pub struct StaticConfigStore {
    configs: RwLock<HashMap<ProviderId, GatewayConfig>>,
}

impl StaticConfigStore {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
        }
    }

    pub fn with(self, config: GatewayConfig) -> Self {
        if let Ok(mut map) = self.configs.write() {
            map.insert(config.provider.clone(), config);
        }
        self
    }

    pub fn insert(&self, config: GatewayConfig) {
        if let Ok(mut map) = self.configs.write() {
            map.insert(config.provider.clone(), config);
        }
    }

    pub fn set_enabled(&self, provider: &ProviderId, enabled: bool) {
        if let Ok(mut map) = self.configs.write() {
            if let Some(config) = map.get_mut(provider) {
                config.enabled = enabled;
            }
        }
    }
}

impl Default for StaticConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for StaticConfigStore {
    fn gateway_config(&self, provider: &ProviderId) -> Option<GatewayConfig> {
        self.configs.read().ok().and_then(|map| map.get(provider).cloned())
    }
}
