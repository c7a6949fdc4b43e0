mod common;

use common::{mock_config, WEBHOOK_SECRET};
use payment_hub::domain::payment::PaymentStatus;
use payment_hub::error::GatewayError;
use payment_hub::gateways::mock::{MockBehavior, MockGateway};
use payment_hub::gateways::{CreateIntentRequest, PaymentGateway, RefundRequest};

fn intent_request(amount_minor: i64, currency: &str) -> CreateIntentRequest {
    CreateIntentRequest {
        amount_minor,
        currency: currency.to_string(),
        metadata: serde_json::Map::new(),
        idempotency_key: Some("idem-1".to_string()),
    }
}

fn refund_request(intent_id: &str, amount_minor: Option<i64>) -> RefundRequest {
    RefundRequest {
        intent_id: intent_id.to_string(),
        amount_minor,
        reason: None,
    }
}

#[tokio::test]
async fn rejects_non_positive_amount_before_any_call() {
    let gateway = MockGateway::new(mock_config(true));
    let err = gateway
        .create_payment_intent(intent_request(0, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidAmount(0)));
}

#[tokio::test]
async fn rejects_unsupported_currency() {
    let gateway = MockGateway::new(mock_config(true));
    let err = gateway
        .create_payment_intent(intent_request(5000, "JPY"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedCurrency { .. }));
    assert_eq!(err.code(), "UNSUPPORTED_CURRENCY");
}

#[tokio::test]
async fn unconfigured_gateway_fails_before_any_call() {
    let mut config = mock_config(true);
    config.api_key = String::new();
    let gateway = MockGateway::new(config);

    assert!(!gateway.is_configured());
    let err = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
}

#[tokio::test]
async fn declined_payment_is_surfaced_as_terminal_error() {
    let gateway = MockGateway::new(mock_config(true)).with_behavior(MockBehavior::Decline);
    let err = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::PaymentDeclined { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn timeout_behavior_is_a_retryable_communication_error() {
    let gateway = MockGateway::new(mock_config(true)).with_behavior(MockBehavior::Timeout);
    let err = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Communication(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn lifecycle_create_confirm_partial_refund() {
    let gateway = MockGateway::new(mock_config(true));

    let intent = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap();
    assert!(matches!(
        intent.status,
        PaymentStatus::Processing | PaymentStatus::RequiresAction
    ));
    assert_eq!(intent.amount_minor, 5000);
    assert_eq!(intent.currency, "USD");

    let confirmed = gateway.confirm_payment(&intent.intent_id, None).await.unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Succeeded);

    let reconfirmed = gateway.confirm_payment(&intent.intent_id, None).await.unwrap();
    assert_eq!(reconfirmed.status, PaymentStatus::Succeeded);

    let record = gateway
        .refund_payment(refund_request(&intent.intent_id, Some(2000)))
        .await
        .unwrap();
    assert_eq!(record.status, PaymentStatus::PartiallyRefunded);

    let after = gateway.get_payment_status(&intent.intent_id).await.unwrap();
    assert_eq!(after.status, PaymentStatus::PartiallyRefunded);
    let refunded = after.metadata["amount_refunded"].as_i64().unwrap();
    assert_eq!(refunded, 2000);
    assert_eq!(after.amount_minor - refunded, 3000);
}

#[tokio::test]
async fn refund_sum_never_exceeds_captured_amount() {
    let gateway = MockGateway::new(mock_config(true));
    let intent = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap();
    gateway.confirm_payment(&intent.intent_id, None).await.unwrap();

    gateway
        .refund_payment(refund_request(&intent.intent_id, Some(4000)))
        .await
        .unwrap();

    let err = gateway
        .refund_payment(refund_request(&intent.intent_id, Some(2000)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::InvalidRefundAmount {
            requested: 2000,
            refundable: 1000
        }
    ));

    let after = gateway.get_payment_status(&intent.intent_id).await.unwrap();
    assert_eq!(after.status, PaymentStatus::PartiallyRefunded);
    assert_eq!(after.metadata["amount_refunded"].as_i64().unwrap(), 4000);
}

#[tokio::test]
async fn omitted_amount_refunds_the_remaining_balance() {
    let gateway = MockGateway::new(mock_config(true));
    let intent = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap();
    gateway.confirm_payment(&intent.intent_id, None).await.unwrap();
    gateway
        .refund_payment(refund_request(&intent.intent_id, Some(1500)))
        .await
        .unwrap();

    let record = gateway
        .refund_payment(refund_request(&intent.intent_id, None))
        .await
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Refunded);
    assert_eq!(record.amount_minor, None);

    let after = gateway.get_payment_status(&intent.intent_id).await.unwrap();
    assert_eq!(after.status, PaymentStatus::Refunded);
    assert_eq!(after.metadata["amount_refunded"].as_i64().unwrap(), 5000);
}

#[tokio::test]
async fn refund_before_capture_is_rejected() {
    let gateway = MockGateway::new(mock_config(true));
    let intent = gateway
        .create_payment_intent(intent_request(5000, "USD"))
        .await
        .unwrap();

    let err = gateway
        .refund_payment(refund_request(&intent.intent_id, Some(1000)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::InvalidRefundAmount { refundable: 0, .. }
    ));
}

#[tokio::test]
async fn unknown_intent_is_not_found() {
    let gateway = MockGateway::new(mock_config(true));
    let err = gateway.get_payment_status("mock_pi_missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));

    let err = gateway.confirm_payment("mock_pi_missing", None).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn sanitized_config_redacts_secret_material() {
    let gateway = MockGateway::new(mock_config(true));
    let sanitized = gateway.sanitized_config();

    let rendered = serde_json::to_string(&sanitized).unwrap();
    assert!(!rendered.contains(WEBHOOK_SECRET));
    assert!(!rendered.contains("mk_test_secret"));
    assert!(sanitized.webhook_secret.ends_with("****"));
    assert_eq!(
        sanitized.supported_currencies,
        vec!["COP".to_string(), "EUR".to_string(), "USD".to_string()]
    );
}
