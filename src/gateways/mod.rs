use crate::domain::event::{NormalizedEvent, RawWebhook};
use crate::domain::payment::{PaymentIntent, RefundRecord};
use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashSet;
use subtle::ConstantTimeEq;

pub mod mock;
pub mod payu;
pub mod registry;
pub mod stripe;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayDescriptor {
    pub provider: ProviderId,
    pub display_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub provider: ProviderId,
    pub api_key: String,
    pub api_secret: String,
    pub webhook_secret: String,
    pub enabled: bool,
    pub supported_currencies: HashSet<String>,
}

impl GatewayConfig {
    pub fn disabled(provider: ProviderId) -> Self {
        Self {
            provider,
            api_key: String::new(),
            api_secret: String::new(),
            webhook_secret: String::new(),
            enabled: false,
            supported_currencies: HashSet::new(),
        }
    }

    pub fn supports_currency(&self, currency: &str) -> bool {
        self.supported_currencies.contains(&currency.to_uppercase())
    }

    pub fn sanitized(&self) -> SanitizedConfig {
        let mut currencies: Vec<String> = self.supported_currencies.iter().cloned().collect();
        currencies.sort();
        SanitizedConfig {
            provider: self.provider.clone(),
            enabled: self.enabled,
            supported_currencies: currencies,
            api_key: mask_secret(&self.api_key),
            api_secret: mask_secret(&self.api_secret),
            webhook_secret: mask_secret(&self.webhook_secret),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub provider: ProviderId,
    pub enabled: bool,
    pub supported_currencies: Vec<String>,
    pub api_key: String,
    pub api_secret: String,
    pub webhook_secret: String,
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        let prefix: String = secret.chars().take(4).collect();
        format!("{prefix}****")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    pub intent_id: String,
    #[serde(default)]
    pub amount_minor: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> ProviderId;

    fn display_name(&self) -> &'static str;

    fn signature_header(&self) -> &'static str;

    async fn create_payment_intent(
        &self,
        req: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn confirm_payment(
        &self,
        intent_id: &str,
        extra: Option<serde_json::Value>,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn get_payment_status(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    async fn refund_payment(&self, req: RefundRequest) -> Result<RefundRecord, GatewayError>;

    fn verify_webhook_signature(&self, raw: &RawWebhook) -> bool;

    fn process_webhook(
        &self,
        raw_body: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<Option<NormalizedEvent>, GatewayError>;

    fn supported_currencies(&self) -> &HashSet<String>;

    fn sanitized_config(&self) -> SanitizedConfig;

    fn is_configured(&self) -> bool;
}

pub(crate) fn preflight(
    config: &GatewayConfig,
    configured: bool,
    req: &CreateIntentRequest,
) -> Result<(), GatewayError> {
    if !configured {
        return Err(GatewayError::Configuration(format!(
            "{} credentials are missing",
            config.provider
        )));
    }
    if req.amount_minor <= 0 {
        return Err(GatewayError::InvalidAmount(req.amount_minor));
    }
    if !config.supports_currency(&req.currency) {
        return Err(GatewayError::UnsupportedCurrency {
            provider: config.provider.clone(),
            currency: req.currency.to_uppercase(),
        });
    }
    Ok(())
}

pub fn hmac_sha256_hex(secret: &str, message: &[u8]) -> Option<String> {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return None,
    };
    mac.update(message);
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_hmac_sha256_hex(secret: &str, message: &[u8], provided_hex: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(message);
    let expected = mac.finalize().into_bytes();
    let provided = match hex::decode(provided_hex.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    expected.as_slice().ct_eq(provided.as_slice()).into()
}
