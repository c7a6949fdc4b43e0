mod common;

use common::{mock_config, mock_provider};
use payment_hub::config::StaticConfigStore;
use payment_hub::error::GatewayError;
use payment_hub::gateways::mock::MockGateway;
use payment_hub::gateways::registry::GatewayRegistry;
use payment_hub::gateways::{GatewayConfig, PaymentGateway, ProviderId};
use std::sync::Arc;
use std::time::Duration;

fn named_config(provider: &str, enabled: bool) -> GatewayConfig {
    let mut config = mock_config(enabled);
    config.provider = ProviderId::new(provider);
    config
}

fn two_provider_registry(ttl: Duration) -> (GatewayRegistry, Arc<StaticConfigStore>) {
    let store = Arc::new(
        StaticConfigStore::new()
            .with(named_config("mock", true))
            .with(named_config("paypal", false)),
    );
    let adapters: Vec<Arc<dyn PaymentGateway>> = vec![
        Arc::new(MockGateway::new(named_config("mock", true))),
        Arc::new(MockGateway::new(named_config("paypal", false))),
    ];
    (GatewayRegistry::new(adapters, store.clone(), ttl), store)
}

#[tokio::test]
async fn create_returns_adapter_for_registered_provider() {
    let (registry, _) = two_provider_registry(Duration::ZERO);
    let adapter = registry.create(&mock_provider()).unwrap();
    assert_eq!(adapter.provider(), mock_provider());
    assert!(registry.is_supported(&mock_provider()));
}

#[tokio::test]
async fn create_rejects_unregistered_provider() {
    let (registry, _) = two_provider_registry(Duration::ZERO);
    let bitcoinpay = ProviderId::new("bitcoinpay");
    let err = match registry.create(&bitcoinpay) {
        Ok(_) => panic!("bitcoinpay must not be registered"),
        Err(e) => e,
    };
    assert!(matches!(err, GatewayError::UnsupportedGateway(_)));
    assert_eq!(err.code(), "UNSUPPORTED_GATEWAY");
    assert!(!registry.is_supported(&bitcoinpay));
    assert!(!registry.is_enabled(&bitcoinpay).await);
}

#[tokio::test]
async fn enabled_is_a_filter_of_available() {
    let (registry, _) = two_provider_registry(Duration::ZERO);
    let available = registry.list_available().await;
    let enabled = registry.list_enabled().await;

    assert_eq!(available.len(), 2);
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].provider, mock_provider());
    for descriptor in &enabled {
        assert!(descriptor.enabled);
        assert!(available
            .iter()
            .any(|a| a.provider == descriptor.provider && a.enabled));
    }
}

#[tokio::test]
async fn missing_credentials_gate_enablement() {
    let mut config = named_config("mock", true);
    config.api_key = String::new();
    let store = Arc::new(StaticConfigStore::new().with(config.clone()));
    let adapter: Arc<dyn PaymentGateway> = Arc::new(MockGateway::new(config));
    let registry = GatewayRegistry::new(vec![adapter], store, Duration::ZERO);

    assert!(!registry.is_enabled(&mock_provider()).await);
    assert!(registry.list_enabled().await.is_empty());
}

#[tokio::test]
async fn config_changes_surface_once_ttl_expires() {
    let (registry, store) = two_provider_registry(Duration::ZERO);
    assert!(registry.is_enabled(&mock_provider()).await);

    store.set_enabled(&mock_provider(), false);
    assert!(!registry.is_enabled(&mock_provider()).await);

    store.set_enabled(&mock_provider(), true);
    assert!(registry.is_enabled(&mock_provider()).await);
}

#[tokio::test]
async fn enablement_is_cached_within_ttl() {
    let (registry, store) = two_provider_registry(Duration::from_secs(300));
    assert!(registry.is_enabled(&mock_provider()).await);

    store.set_enabled(&mock_provider(), false);
    assert!(registry.is_enabled(&mock_provider()).await);
}
