use crate::domain::event::{EventKind, NormalizedEvent, RawWebhook};
use crate::domain::payment::{PaymentIntent, PaymentStatus, RefundRecord};
use crate::error::GatewayError;
use crate::gateways::{
    preflight, verify_hmac_sha256_hex, CreateIntentRequest, GatewayConfig, PaymentGateway,
    ProviderId, RefundRequest, SanitizedConfig,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Approve,
    Decline,
    Timeout,
}

struct LedgerEntry {
    amount_minor: i64,
    currency: String,
    refunded_minor: i64,
    status: PaymentStatus,
    metadata: serde_json::Map<String, serde_json::Value>,
}

pub struct MockGateway {
    config: GatewayConfig,
    behavior: MockBehavior,
    ledger: Mutex<HashMap<String, LedgerEntry>>,
}

impl MockGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            behavior: MockBehavior::Approve,
            ledger: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn intent_view(&self, intent_id: &str, entry: &LedgerEntry) -> PaymentIntent {
        let mut metadata = entry.metadata.clone();
        metadata.insert("amount_refunded".to_string(), entry.refunded_minor.into());
        PaymentIntent {
            intent_id: intent_id.to_string(),
            amount_minor: entry.amount_minor,
            currency: entry.currency.clone(),
            status: entry.status,
            metadata,
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> ProviderId {
        self.config.provider.clone()
    }

    fn display_name(&self) -> &'static str {
        "Mock Processor"
    }

    fn signature_header(&self) -> &'static str {
        "X-Mock-Signature"
    }

    async fn create_payment_intent(
        &self,
        req: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        preflight(&self.config, self.is_configured(), &req)?;

        match self.behavior {
            MockBehavior::Decline => Err(GatewayError::PaymentDeclined {
                code: "mock_declined".to_string(),
                message: "the payment was declined".to_string(),
            }),
            MockBehavior::Timeout => Err(GatewayError::Communication(
                "mock gateway timed out".to_string(),
            )),
            MockBehavior::Approve => {
                let intent_id = format!("mock_pi_{}", Uuid::new_v4().simple());
                let entry = LedgerEntry {
                    amount_minor: req.amount_minor,
                    currency: req.currency.to_uppercase(),
                    refunded_minor: 0,
                    status: PaymentStatus::Processing,
                    metadata: req.metadata,
                };
                let view = self.intent_view(&intent_id, &entry);
                self.ledger.lock().await.insert(intent_id, entry);
                Ok(view)
            }
        }
    }

    async fn confirm_payment(
        &self,
        intent_id: &str,
        _extra: Option<serde_json::Value>,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut ledger = self.ledger.lock().await;
        let entry = ledger
            .get_mut(intent_id)
            .ok_or_else(|| GatewayError::NotFound(intent_id.to_string()))?;

        if entry.status == PaymentStatus::RequiresAction || entry.status == PaymentStatus::Processing
        {
            entry.status = PaymentStatus::Succeeded;
        }
        Ok(self.intent_view(intent_id, entry))
    }

    async fn get_payment_status(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let ledger = self.ledger.lock().await;
        let entry = ledger
            .get(intent_id)
            .ok_or_else(|| GatewayError::NotFound(intent_id.to_string()))?;
        Ok(self.intent_view(intent_id, entry))
    }

    async fn refund_payment(&self, req: RefundRequest) -> Result<RefundRecord, GatewayError> {
        let mut ledger = self.ledger.lock().await;
        let entry = ledger
            .get_mut(&req.intent_id)
            .ok_or_else(|| GatewayError::NotFound(req.intent_id.clone()))?;

        if !entry.status.is_settled() {
            return Err(GatewayError::InvalidRefundAmount {
                requested: req.amount_minor.unwrap_or(0),
                refundable: 0,
            });
        }

        let remaining = entry.amount_minor - entry.refunded_minor;
        let requested = req.amount_minor.unwrap_or(remaining);
        if requested <= 0 {
            return Err(GatewayError::InvalidAmount(requested));
        }
        if requested > remaining {
            return Err(GatewayError::InvalidRefundAmount {
                requested,
                refundable: remaining,
            });
        }

        entry.refunded_minor += requested;
        entry.status = if entry.refunded_minor == entry.amount_minor {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };

        Ok(RefundRecord {
            intent_id: req.intent_id,
            amount_minor: req.amount_minor,
            reason: req.reason,
            status: entry.status,
        })
    }

    fn verify_webhook_signature(&self, raw: &RawWebhook) -> bool {
        match &raw.signature {
            Some(signature) => {
                verify_hmac_sha256_hex(&self.config.webhook_secret, &raw.body, signature)
            }
            None => false,
        }
    }

    fn process_webhook(
        &self,
        raw_body: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<Option<NormalizedEvent>, GatewayError> {
        let payload: serde_json::Value = serde_json::from_slice(raw_body)
            .map_err(|e| GatewayError::InvalidWebhook(e.to_string()))?;

        let event_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidWebhook("missing event id".to_string()))?
            .to_string();
        let event_type = payload
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidWebhook("missing event type".to_string()))?;

        let status = match event_type {
            "payment.requires_action" => PaymentStatus::RequiresAction,
            "payment.processing" => PaymentStatus::Processing,
            "payment.succeeded" => PaymentStatus::Succeeded,
            "payment.failed" => PaymentStatus::Failed,
            "payment.canceled" => PaymentStatus::Canceled,
            "refund.succeeded" => {
                let data = payload.get("data");
                let intent_id = data
                    .and_then(|d| d.get("intent_id"))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        GatewayError::InvalidWebhook("refund event missing intent_id".to_string())
                    })?
                    .to_string();
                return Ok(Some(NormalizedEvent {
                    provider: self.provider(),
                    event_id,
                    intent_id,
                    kind: EventKind::Refunded {
                        amount_minor: data
                            .and_then(|d| d.get("amount_minor"))
                            .and_then(|v| v.as_i64()),
                    },
                    received_at,
                }));
            }
            _ => return Ok(None),
        };

        let intent_id = payload
            .get("data")
            .and_then(|d| d.get("intent_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidWebhook("missing intent_id".to_string()))?
            .to_string();

        Ok(Some(NormalizedEvent {
            provider: self.provider(),
            event_id,
            intent_id,
            kind: EventKind::StatusChanged { status },
            received_at,
        }))
    }

    fn supported_currencies(&self) -> &HashSet<String> {
        &self.config.supported_currencies
    }

    fn sanitized_config(&self) -> SanitizedConfig {
        self.config.sanitized()
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.webhook_secret.is_empty()
    }
}
