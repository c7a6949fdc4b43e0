use crate::domain::event::{EventKind, NormalizedEvent, RawWebhook};
use crate::domain::payment::{PaymentIntent, PaymentStatus, RefundRecord};
use crate::error::GatewayError;
use crate::gateways::{
    preflight, verify_hmac_sha256_hex, CreateIntentRequest, GatewayConfig, PaymentGateway,
    ProviderId, RefundRequest, SanitizedConfig,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub struct StripeGateway {
    config: GatewayConfig,
    base_url: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl StripeGateway {
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
                "stripe credentials are missing".to_string(),
            ))
        }
    }

    async fn fetch_intent(&self, intent_id: &str) -> Result<serde_json::Value, GatewayError> {
        let url = format!(
            "{}/v1/payment_intents/{}?expand[]=latest_charge",
            self.base_url, intent_id
        );
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_secret)
            .timeout(self.timeout())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    fn parse_intent(&self, v: &serde_json::Value) -> Result<PaymentIntent, GatewayError> {
        let intent_id = v
            .get("id")
            .and_then(|x| x.as_str())
            .ok_or_else(|| {
                GatewayError::Communication("provider response missing intent id".to_string())
            })?
            .to_string();
        let amount_minor = v.get("amount").and_then(|x| x.as_i64()).unwrap_or(0);
        let currency = v
            .get("currency")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_uppercase();
        let mut status = map_intent_status(
            v.get("status").and_then(|x| x.as_str()).unwrap_or_default(),
        );

        if status == PaymentStatus::Succeeded {
            let captured = v
                .get("amount_received")
                .and_then(|x| x.as_i64())
                .unwrap_or(amount_minor);
            let refunded = v
                .get("latest_charge")
                .and_then(|c| c.get("amount_refunded"))
                .and_then(|x| x.as_i64())
                .unwrap_or(0);
            if refunded > 0 {
                status = if refunded >= captured {
                    PaymentStatus::Refunded
                } else {
                    PaymentStatus::PartiallyRefunded
                };
            }
        }

        let metadata = v
            .get("metadata")
            .and_then(|x| x.as_object())
            .cloned()
            .unwrap_or_default();

        Ok(PaymentIntent {
            intent_id,
            amount_minor,
            currency,
            status,
            metadata,
        })
    }
}

#[async_trait::async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> ProviderId {
        ProviderId::new("stripe")
    }

    fn display_name(&self) -> &'static str {
        "Stripe"
    }

    fn signature_header(&self) -> &'static str {
        "Stripe-Signature"
    }

    async fn create_payment_intent(
        &self,
        req: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        preflight(&self.config, self.is_configured(), &req)?;

        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), req.amount_minor.to_string()),
            ("currency".to_string(), req.currency.to_lowercase()),
        ];
        for (key, value) in &req.metadata {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form.push((format!("metadata[{key}]"), rendered));
        }

        let mut request = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.config.api_secret)
            .timeout(self.timeout())
            .form(&form);
        if let Some(key) = &req.idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let resp = request.send().await?;
        if resp.status().is_success() {
            self.parse_intent(&resp.json().await?)
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

        let current = self.parse_intent(&self.fetch_intent(intent_id).await?)?;
        if current.status.is_settled() || current.status.is_terminal() {
            return Ok(current);
        }

        let mut form: Vec<(String, String)> = Vec::new();
        if let Some(serde_json::Value::Object(fields)) = extra {
            for (key, value) in fields {
                let rendered = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                form.push((key, rendered));
            }
        }

        let resp = self
            .client
            .post(format!(
                "{}/v1/payment_intents/{}/confirm",
                self.base_url, intent_id
            ))
            .bearer_auth(&self.config.api_secret)
            .timeout(self.timeout())
            .form(&form)
            .send()
            .await?;
        if resp.status().is_success() {
            self.parse_intent(&resp.json().await?)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn get_payment_status(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.ensure_configured()?;
        self.parse_intent(&self.fetch_intent(intent_id).await?)
    }

    async fn refund_payment(&self, req: RefundRequest) -> Result<RefundRecord, GatewayError> {
        self.ensure_configured()?;

        let intent = self.fetch_intent(&req.intent_id).await?;
        let captured = intent
            .get("amount_received")
            .and_then(|x| x.as_i64())
            .unwrap_or(0);
        let refunded = intent
            .get("latest_charge")
            .and_then(|c| c.get("amount_refunded"))
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

        let mut form: Vec<(String, String)> = vec![
            ("payment_intent".to_string(), req.intent_id.clone()),
            ("amount".to_string(), requested.to_string()),
        ];
        if let Some(reason) = &req.reason {
            form.push(("metadata[reason]".to_string(), reason.clone()));
        }

        let resp = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.config.api_secret)
            .timeout(self.timeout())
            .form(&form)
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
        let header = match &raw.signature {
            Some(h) => h,
            None => return false,
        };

        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }
        let timestamp = match timestamp {
            Some(t) => t,
            None => return false,
        };
        if candidates.is_empty() {
            return false;
        }

        let mut message = Vec::with_capacity(timestamp.len() + 1 + raw.body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'.');
        message.extend_from_slice(&raw.body);

        candidates
            .iter()
            .any(|sig| verify_hmac_sha256_hex(&self.config.webhook_secret, &message, sig))
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
        let object = payload.get("data").and_then(|d| d.get("object"));

        let kind = match event_type {
            "payment_intent.succeeded" => EventKind::StatusChanged {
                status: PaymentStatus::Succeeded,
            },
            "payment_intent.processing" => EventKind::StatusChanged {
                status: PaymentStatus::Processing,
            },
            "payment_intent.requires_action" => EventKind::StatusChanged {
                status: PaymentStatus::RequiresAction,
            },
            "payment_intent.payment_failed" => EventKind::StatusChanged {
                status: PaymentStatus::Failed,
            },
            "payment_intent.canceled" => EventKind::StatusChanged {
                status: PaymentStatus::Canceled,
            },
            "charge.refunded" => EventKind::Refunded {
                amount_minor: object
                    .and_then(|o| o.get("amount_refunded"))
                    .and_then(|v| v.as_i64()),
            },
            _ => return Ok(None),
        };

        let intent_id = match kind {
            EventKind::Refunded { .. } => object
                .and_then(|o| o.get("payment_intent"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    GatewayError::InvalidWebhook("refund event missing payment_intent".to_string())
                })?
                .to_string(),
            EventKind::StatusChanged { .. } => object
                .and_then(|o| o.get("id"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    GatewayError::InvalidWebhook("event object missing intent id".to_string())
                })?
                .to_string(),
        };

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
        !self.config.api_secret.is_empty() && !self.config.webhook_secret.is_empty()
    }
}

fn map_intent_status(status: &str) -> PaymentStatus {
    match status {
        "requires_payment_method" | "requires_confirmation" | "requires_action"
        | "requires_capture" => PaymentStatus::RequiresAction,
        "processing" => PaymentStatus::Processing,
        "succeeded" => PaymentStatus::Succeeded,
        "canceled" => PaymentStatus::Canceled,
        other => {
            tracing::warn!(status = other, "unrecognized stripe intent status");
            PaymentStatus::Processing
        }
    }
}

async fn error_from_response(resp: reqwest::Response) -> GatewayError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let code = parsed
        .get("error")
        .and_then(|e| e.get("decline_code").or_else(|| e.get("code")))
        .and_then(|c| c.as_str())
        .unwrap_or("provider_error");

    tracing::warn!(
        status = status.as_u16(),
        body = %body.chars().take(200).collect::<String>(),
        "stripe returned an error response"
    );

    match status.as_u16() {
        402 => GatewayError::PaymentDeclined {
            code: code.to_string(),
            message: "the payment was declined by the provider".to_string(),
        },
        404 => GatewayError::NotFound(code.to_string()),
        _ => GatewayError::Communication(format!("provider returned HTTP {}", status.as_u16())),
    }
}
