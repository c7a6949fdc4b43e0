use crate::domain::event::{EventKind, NormalizedEvent, RawWebhook};
use crate::domain::payment::{PaymentIntent, PaymentStatus, RefundRecord};
use crate::error::GatewayError;
use crate::gateways::{
    preflight, verify_hmac_sha256_hex, CreateIntentRequest, GatewayConfig, PaymentGateway,
    ProviderId, RefundRequest, SanitizedConfig,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashSet;

pub struct PayuGateway {
    config: GatewayConfig,
    base_url: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl PayuGateway {
    pub fn new(config: GatewayConfig, base_url: String, timeout_ms: u64) -> Self {
        Self {
            config,
            base_url,
            timeout_ms,
            client: reqwest::Client::new(),
        }
    }

    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(GatewayError::Configuration(
                "payu credentials are missing".to_string(),
            ))
        }
    }

    async fn fetch_transaction(&self, intent_id: &str) -> Result<serde_json::Value, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, intent_id))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .timeout(self.timeout())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    fn parse_transaction(&self, v: &serde_json::Value) -> Result<PaymentIntent, GatewayError> {
        let intent_id = v
            .get("id")
            .and_then(|x| x.as_str())
            .ok_or_else(|| {
                GatewayError::Communication("provider response missing transaction id".to_string())
            })?
            .to_string();
        Ok(PaymentIntent {
            intent_id,
            amount_minor: v.get("amount_in_cents").and_then(|x| x.as_i64()).unwrap_or(0),
            currency: v
                .get("currency")
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_uppercase(),
            status: map_transaction_status(
                v.get("status").and_then(|x| x.as_str()).unwrap_or_default(),
            ),
            metadata: v
                .get("metadata")
                .and_then(|x| x.as_object())
                .cloned()
                .unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl PaymentGateway for PayuGateway {
    fn provider(&self) -> ProviderId {
        ProviderId::new("payu")
    }

    fn display_name(&self) -> &'static str {
        "PayU"
    }

    fn signature_header(&self) -> &'static str {
        "X-Payu-Signature"
    }

    async fn create_payment_intent(
        &self,
        req: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        preflight(&self.config, self.is_configured(), &req)?;

        let body = json!({
            "amount_in_cents": req.amount_minor,
            "currency": req.currency.to_uppercase(),
            "metadata": req.metadata,
        });

        let mut request = self
            .client
            .post(format!("{}/v1/payments", self.base_url))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .timeout(self.timeout())
            .json(&body);
        if let Some(key) = &req.idempotency_key {
            request = request.header("X-Idempotency-Key", key);
        }

        let resp = request.send().await?;
        if resp.status().is_success() {
            self.parse_transaction(&resp.json().await?)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn confirm_payment(
        &self,
        intent_id: &str,
        extra: Option<serde_json::Value>,
    ) -> Result<PaymentIntent, GatewayError> {
        self.ensure_configured()?;

        let current = self.parse_transaction(&self.fetch_transaction(intent_id).await?)?;
        if current.status.is_settled() || current.status.is_terminal() {
            return Ok(current);
        }

        let resp = self
            .client
            .post(format!("{}/v1/payments/{}/capture", self.base_url, intent_id))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .timeout(self.timeout())
            .json(&extra.unwrap_or_else(|| json!({})))
            .send()
            .await?;
        if resp.status().is_success() {
            self.parse_transaction(&resp.json().await?)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn get_payment_status(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.ensure_configured()?;
        self.parse_transaction(&self.fetch_transaction(intent_id).await?)
    }

    async fn refund_payment(&self, req: RefundRequest) -> Result<RefundRecord, GatewayError> {
        self.ensure_configured()?;

        let transaction = self.fetch_transaction(&req.intent_id).await?;
        let captured = transaction
            .get("amount_in_cents")
            .and_then(|x| x.as_i64())
            .unwrap_or(0);
        let refunded = transaction
            .get("amount_refunded_in_cents")
            .and_then(|x| x.as_i64())
            .unwrap_or(0);
        let remaining = captured - refunded;

        let requested = req.amount_minor.unwrap_or(remaining);
        if requested <= 0 {
            return Err(GatewayError::InvalidAmount(requested));
        }
        if requested > remaining {
            return Err(GatewayError::InvalidRefundAmount {
                requested,
                refundable: remaining.max(0),
            });
        }

        let resp = self
            .client
            .post(format!(
                "{}/v1/payments/{}/refunds",
                self.base_url, req.intent_id
            ))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .timeout(self.timeout())
            .json(&json!({
                "amount_in_cents": requested,
                "reason": req.reason,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let status = if requested == remaining {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        Ok(RefundRecord {
            intent_id: req.intent_id,
            amount_minor: req.amount_minor,
            reason: req.reason,
            status,
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
            .get("event_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidWebhook("missing event_id".to_string()))?
            .to_string();
        let event = payload
            .get("event")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidWebhook("missing event name".to_string()))?;
        let transaction = payload.get("transaction");
        let intent_id = transaction
            .and_then(|t| t.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let kind = match event {
            "transaction.updated" => {
                let status = map_transaction_status(
                    transaction
                        .and_then(|t| t.get("status"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default(),
                );
                EventKind::StatusChanged { status }
            }
            "transaction.refunded" => EventKind::Refunded {
                amount_minor: transaction
                    .and_then(|t| t.get("amount_refunded_in_cents"))
                    .and_then(|v| v.as_i64()),
            },
            _ => return Ok(None),
        };

        let intent_id = intent_id.ok_or_else(|| {
            GatewayError::InvalidWebhook("missing transaction id".to_string())
        })?;

        Ok(Some(NormalizedEvent {
            provider: self.provider(),
            event_id,
            intent_id,
            kind,
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
        !self.config.api_key.is_empty()
            && !self.config.api_secret.is_empty()
            && !self.config.webhook_secret.is_empty()
    }
}

fn map_transaction_status(status: &str) -> PaymentStatus {
    match status {
        "AWAITING_CONFIRMATION" | "CHALLENGE_REQUIRED" => PaymentStatus::RequiresAction,
        "PENDING" => PaymentStatus::Processing,
        "APPROVED" => PaymentStatus::Succeeded,
        "DECLINED" | "ERROR" => PaymentStatus::Failed,
        "EXPIRED" | "VOIDED" => PaymentStatus::Canceled,
        "REFUNDED" => PaymentStatus::Refunded,
        "PARTIALLY_REFUNDED" => PaymentStatus::PartiallyRefunded,
        other => {
            tracing::warn!(status = other, "unrecognized payu transaction status");
            PaymentStatus::Processing
        }
    }
}

async fn error_from_response(resp: reqwest::Response) -> GatewayError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let code = parsed
        .get("code")
        .and_then(|c| c.as_str())
        .unwrap_or("provider_error");

    tracing::warn!(
        status = status.as_u16(),
        body = %body.chars().take(200).collect::<String>(),
        "payu returned an error response"
    );

    match status.as_u16() {
        402 | 422 => GatewayError::PaymentDeclined {
            code: code.to_string(),
            message: "the payment was declined by the provider".to_string(),
        },
        404 => GatewayError::NotFound(code.to_string()),
        _ => GatewayError::Communication(format!("provider returned HTTP {}", status.as_u16())),
    }
}
