//! Integration tests for idempotent checkout.
//!
//! These tests drive `CheckoutAttempt` against the mock backend and inspect
//! the `Idempotency-Key` header of every order and payment request it sends.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use blossom_core::{
    DeliveryMethod, IdempotencyKey, MemberId, OptionId, OrderStatus, PaymentMethod, ProductId,
};
use blossom_integration_tests::{MEMBER_ID, MockBackend, Reply, immediate_retries};
use blossom_storefront::FailureKind;
use blossom_storefront::cart::CartView;
use blossom_storefront::checkout::{
    CheckoutAttempt, CheckoutError, CheckoutState, DirectOrder, Payment,
};
use blossom_storefront::types::DeliveryDetails;
use rust_decimal::Decimal;

fn delivery() -> DeliveryDetails {
    DeliveryDetails::new(
        DeliveryMethod::Quick,
        "Kim Florist",
        "010-1234-5678",
        "1 Teheran-ro, Seoul",
    )
}

fn direct_order(product_id: i64, quantity: i64) -> DirectOrder {
    DirectOrder::new(
        MemberId::new(MEMBER_ID),
        ProductId::new(product_id),
        quantity,
        Vec::new(),
        delivery(),
    )
}

fn keys(backend: &MockBackend, path: &str) -> Vec<String> {
    backend
        .requests_to(&Method::POST, path)
        .iter()
        .map(|request| request.idempotency_key().unwrap().to_string())
        .collect()
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn test_direct_purchase_then_payment() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut details = delivery();
    details.message_card = Some("Happy birthday".to_string());
    let order = DirectOrder::new(
        MemberId::new(MEMBER_ID),
        ProductId::new(1),
        2,
        vec![OptionId::new(11)],
        details,
    );
    let mut attempt = CheckoutAttempt::begin(client.clone(), order);
    let placed = attempt.submit().await.unwrap();

    assert_eq!(placed.status, OrderStatus::Pending);
    assert_eq!(placed.total_amount, Decimal::from(50_000));
    assert!(matches!(attempt.state(), CheckoutState::Succeeded(_)));

    let requests = backend.requests_to(&Method::POST, "/orders/direct");
    assert_eq!(requests.len(), 1);
    let key = requests[0].idempotency_key().unwrap();
    assert_eq!(key, attempt.key().as_str());
    assert!(IdempotencyKey::parse(key).is_ok());

    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["isDirectOrder"], true);
    assert_eq!(body["productId"], 1);
    assert_eq!(body["optionIds"], serde_json::json!([11]));
    assert_eq!(body["deliveryMethod"], "QUICK");
    assert_eq!(body["messageCard"], "Happy birthday");

    // Paying is its own attempt with its own key
    let mut payment = CheckoutAttempt::begin(client, Payment::new(placed.id, PaymentMethod::Card));
    let paid = payment.submit().await.unwrap();

    assert_eq!(paid.id, placed.id);
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(backend.payment_count(), 1);

    let payment_keys = keys(&backend, "/payments");
    assert_eq!(payment_keys, vec![payment.key().to_string()]);
    assert_ne!(payment_keys[0], key);

    let body = backend.requests_to(&Method::POST, "/payments")[0].body.clone().unwrap();
    assert_eq!(body["paymentMethod"], "CARD");
}

#[tokio::test]
async fn test_cart_checkout_empties_cart() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut cart = CartView::load(&client).await.unwrap();
    cart.add(ProductId::new(2), 1, Vec::new()).await.unwrap();
    assert_eq!(cart.total_price(), Decimal::from(45_000));

    let mut attempt = cart.checkout(delivery()).unwrap();
    let order = attempt.submit().await.unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_name, "Tulip Basket");

    let requests = backend.requests_to(&Method::POST, "/orders");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body.as_ref().unwrap()["isDirectOrder"], false);

    cart.reload().await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let cart = CartView::load(&client).await.unwrap();
    let err = cart.checkout(delivery()).err().unwrap();

    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(backend.requests_to(&Method::POST, "/orders").is_empty());
}

// =============================================================================
// Transient Failures
// =============================================================================

#[tokio::test]
async fn test_server_error_offers_retry_with_same_key() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    backend.script(
        Method::POST,
        "/orders/direct",
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR),
    );

    let mut attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    let err = attempt.submit().await.unwrap_err();

    let failure = err.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Transient);
    assert_eq!(failure.status, Some(500));

    let prompt = attempt.state().prompt().unwrap();
    assert!(prompt.retry_offered);
    assert!(!prompt.edit_required);
    assert!(!prompt.message.is_empty());
    assert!(attempt.can_submit());

    let order = attempt.retry().await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let sent = keys(&backend, "/orders/direct");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(sent[0], attempt.key().as_str());
    assert_eq!(backend.orders().len(), 1);
}

#[tokio::test]
async fn test_lost_response_is_not_ordered_twice() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    backend.script(
        Method::POST,
        "/orders/direct",
        Reply::status(StatusCode::BAD_GATEWAY).after_processing(),
    );

    let mut attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    assert!(attempt.submit().await.is_err());
    assert_eq!(backend.orders().len(), 1);

    let order = attempt.retry().await.unwrap();

    assert_eq!(backend.orders().len(), 1);
    assert_eq!(order.order_no, "ORD-00001");
}

#[tokio::test]
async fn test_automatic_retries_reuse_key() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    for _ in 0..2 {
        backend.script(
            Method::POST,
            "/orders/direct",
            Reply::status(StatusCode::SERVICE_UNAVAILABLE),
        );
    }

    let mut attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    let order = attempt.submit_with(&immediate_retries(2)).await.unwrap();

    assert_eq!(order.id.as_i64(), 1);
    assert_eq!(attempt.tries(), 3);
    let sent = keys(&backend, "/orders/direct");
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|key| key == attempt.key().as_str()));
}

#[tokio::test]
async fn test_retries_give_up_after_policy_limit() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    for _ in 0..3 {
        backend.script(
            Method::POST,
            "/orders/direct",
            Reply::status(StatusCode::TOO_MANY_REQUESTS),
        );
    }

    let mut attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    let err = attempt.submit_with(&immediate_retries(2)).await.unwrap_err();

    assert_eq!(err.failure().unwrap().status, Some(429));
    assert_eq!(keys(&backend, "/orders/direct").len(), 3);
    assert!(backend.orders().is_empty());
    // The retry control stays available
    assert!(attempt.state().prompt().unwrap().retry_offered);
}

#[tokio::test]
async fn test_payment_server_error_retries_with_same_key() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut order = CheckoutAttempt::begin(client.clone(), direct_order(2, 1));
    let placed = order.submit().await.unwrap();

    backend.script(
        Method::POST,
        "/payments",
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR),
    );
    let mut payment = CheckoutAttempt::begin(
        client,
        Payment::new(placed.id, PaymentMethod::BankTransfer),
    );
    let err = payment.submit().await.unwrap_err();
    assert!(err.failure().unwrap().is_retryable());

    let paid = payment.submit().await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);

    let sent = keys(&backend, "/payments");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(backend.payment_count(), 1);
}

#[tokio::test]
async fn test_payment_refresh_failure_retries_with_same_key() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut order = CheckoutAttempt::begin(client.clone(), direct_order(1, 1));
    let placed = order.submit().await.unwrap();

    backend.script(
        Method::GET,
        &format!("/orders/{}", placed.id),
        Reply::status(StatusCode::NOT_FOUND),
    );
    let mut payment = CheckoutAttempt::begin(client, Payment::new(placed.id, PaymentMethod::Card));
    let err = payment.submit().await.unwrap_err();

    assert_eq!(err.failure().unwrap().kind, FailureKind::Unconfirmed);
    assert_eq!(backend.payment_count(), 1);
    assert_eq!(
        payment.revise(Payment::new(placed.id, PaymentMethod::Card)),
        Err(CheckoutError::OutcomeUnknown)
    );

    let paid = payment.retry().await.unwrap();

    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(backend.payment_count(), 1);
    let sent = keys(&backend, "/payments");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

#[tokio::test]
async fn test_resumed_attempt_reuses_key_from_earlier_run() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    for _ in 0..3 {
        backend.script(
            Method::POST,
            "/orders/direct",
            Reply::status(StatusCode::SERVICE_UNAVAILABLE).after_processing(),
        );
    }

    let mut first_run = CheckoutAttempt::begin(client.clone(), direct_order(1, 1));
    let err = first_run.submit_with(&immediate_retries(2)).await.unwrap_err();
    assert!(err.failure().unwrap().is_retryable());
    let key = first_run.key().clone();
    first_run.abandon();

    let mut second_run = CheckoutAttempt::resume(client, direct_order(1, 1), key.clone());
    let order = second_run.submit().await.unwrap();

    assert_eq!(order.order_no, "ORD-00001");
    assert_eq!(backend.orders().len(), 1);
    let sent = keys(&backend, "/orders/direct");
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|sent_key| sent_key == key.as_str()));
}

// =============================================================================
// New Actions and Revisions
// =============================================================================

#[tokio::test]
async fn test_each_checkout_action_gets_a_new_key() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    for _ in 0..3 {
        let mut attempt = CheckoutAttempt::begin(client.clone(), direct_order(1, 1));
        attempt.submit().await.unwrap();
    }

    let sent = keys(&backend, "/orders/direct");
    assert_eq!(sent.len(), 3);
    let distinct: HashSet<&String> = sent.iter().collect();
    assert_eq!(distinct.len(), 3);
    assert_eq!(backend.orders().len(), 3);
}

#[tokio::test]
async fn test_permanent_failure_requires_revision() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    // Only three tulip baskets are in stock
    let mut attempt = CheckoutAttempt::begin(client, direct_order(2, 5));
    let err = attempt.submit().await.unwrap_err();

    let failure = err.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Permanent);
    assert_eq!(failure.status, Some(409));
    assert!(attempt.state().prompt().unwrap().edit_required);
    assert_eq!(attempt.retry().await.unwrap_err(), CheckoutError::NotRetryable);

    let first_key = attempt.key().clone();
    attempt.revise(direct_order(2, 2)).unwrap();
    assert_ne!(attempt.key(), &first_key);
    assert_eq!(attempt.state(), CheckoutState::Idle);

    let order = attempt.submit().await.unwrap();
    assert_eq!(order.total_quantity(), 2);

    let sent = keys(&backend, "/orders/direct");
    assert_eq!(sent, vec![first_key.to_string(), attempt.key().to_string()]);
}

#[tokio::test]
async fn test_succeeded_attempt_cannot_resubmit() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    attempt.submit().await.unwrap();

    assert_eq!(attempt.submit().await.unwrap_err(), CheckoutError::AlreadySucceeded);
    assert!(attempt.revise(direct_order(1, 2)).is_err());
    assert_eq!(keys(&backend, "/orders/direct").len(), 1);
}

// =============================================================================
// Local Rejection
// =============================================================================

#[tokio::test]
async fn test_invalid_order_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;

    let mut blank = delivery();
    blank.delivery_phone = "  ".to_string();
    let invalid = [
        direct_order(1, 0),
        DirectOrder::new(MemberId::new(MEMBER_ID), ProductId::new(1), 1, Vec::new(), blank),
    ];

    for order in invalid {
        let mut attempt = CheckoutAttempt::begin(client.clone(), order);
        let err = attempt.submit().await.unwrap_err();
        assert_eq!(err.failure().unwrap().kind, FailureKind::Validation);
        assert_eq!(attempt.state(), CheckoutState::Idle);
        assert_eq!(attempt.tries(), 0);
    }

    assert!(backend.requests_to(&Method::POST, "/orders/direct").is_empty());
}

#[tokio::test]
async fn test_abandoned_attempt_sends_nothing() {
    let backend = MockBackend::start().await;
    let client = backend.signed_in_client().await;
    let before = backend.requests().len();

    let attempt = CheckoutAttempt::begin(client, direct_order(1, 1));
    attempt.abandon();

    assert_eq!(backend.requests().len(), before);
}
