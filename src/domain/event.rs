use crate::domain::payment::PaymentStatus;
use crate::gateways::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RawWebhook {
    pub provider: ProviderId,
    pub signature: Option<String>,
    pub body: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub provider: ProviderId,
    pub event_id: String,
    pub intent_id: String,
    pub kind: EventKind,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    StatusChanged { status: PaymentStatus },
    Refunded { amount_minor: Option<i64> },
}

impl NormalizedEvent {
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::StatusChanged { .. } => "payment.status_changed",
            EventKind::Refunded { .. } => "payment.refunded",
        }
    }
}
