use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresAction,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Canceled | PaymentStatus::Refunded)
    }

    pub fn is_settled(self) -> bool {
        matches!(
            self,
            PaymentStatus::Succeeded | PaymentStatus::PartiallyRefunded | PaymentStatus::Refunded
        )
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        if self == next {
            return true;
        }
        match self {
            RequiresAction => matches!(next, Processing | Succeeded | Failed | Canceled),
            Processing => matches!(next, Succeeded | Failed | Canceled),
            Succeeded => matches!(next, PartiallyRefunded | Refunded),
            PartiallyRefunded => matches!(next, Refunded),
            Failed | Canceled | Refunded => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub intent_id: String,
    pub amount_minor: Option<i64>,
    pub reason: Option<String>,
    pub status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::PaymentStatus::*;

    #[test]
    fn succeeded_admits_only_refund_states() {
        assert!(Succeeded.can_transition_to(PartiallyRefunded));
        assert!(Succeeded.can_transition_to(Refunded));
        assert!(!Succeeded.can_transition_to(Processing));
        assert!(!Succeeded.can_transition_to(Failed));
    }

    #[test]
    fn refunded_is_terminal() {
        assert!(!Refunded.can_transition_to(Succeeded));
        assert!(!Refunded.can_transition_to(PartiallyRefunded));
        assert!(Refunded.is_terminal());
    }

    #[test]
    fn partial_refund_can_complete() {
        assert!(PartiallyRefunded.can_transition_to(Refunded));
        assert!(!PartiallyRefunded.can_transition_to(Succeeded));
    }

    #[test]
    fn processing_settles_or_fails() {
        assert!(Processing.can_transition_to(Succeeded));
        assert!(Processing.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Canceled));
        assert!(!Processing.can_transition_to(Refunded));
    }
}
