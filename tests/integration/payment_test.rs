use crate::support::{confirmation, TestApp};
use imagify::{store::TransactionStore, ApiError};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

#[tokio::test]
async fn test_create_order_records_pending_transaction() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;

    let order = app
        .state
        .payment_service
        .create_order(user_id, "basic")
        .await
        .unwrap();

    assert_eq!(order.amount, 1000);
    assert_eq!(order.currency, "INR");
    assert_eq!(app.store.transaction_count().await, 1);

    let transaction = app
        .store
        .find_by_order_id(&order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transaction.user_id, user_id);
    assert_eq!(transaction.credits, 100);
    assert_eq!(transaction.amount, 1000);
    assert_eq!(transaction.id.to_string(), order.receipt);
    assert!(!transaction.payment);
    assert!(transaction.confirmed_at.is_none());
}

#[tokio::test]
async fn test_unknown_plan_leaves_no_record() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;

    let err = app
        .state
        .payment_service
        .create_order(user_id, "platinum")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidPlan(_)));
    assert_eq!(app.store.transaction_count().await, 0);
    assert_eq!(app.gateway.orders(), 0);
}

#[tokio::test]
async fn test_gateway_failure_leaves_no_record() {
    let app = TestApp::with_failing_gateway();
    let user_id = app.user_with_credits(0).await;

    let err = app
        .state
        .payment_service
        .create_order(user_id, "basic")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Upstream(_)));
    assert_eq!(app.gateway.orders(), 1);
    assert_eq!(app.store.transaction_count().await, 0);
}

#[tokio::test]
async fn test_confirmed_payment_credits_plan() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(2).await;
    let order = app
        .state
        .payment_service
        .create_order(user_id, "basic")
        .await
        .unwrap();

    let confirmed = app
        .state
        .payment_service
        .confirm_payment(user_id, &confirmation(&order.id))
        .await
        .unwrap();

    assert!(confirmed.newly_credited);
    assert_eq!(confirmed.credit_balance, 102);
    assert_eq!(app.balance(user_id).await, 102);

    let transaction = app
        .store
        .find_by_order_id(&order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(transaction.payment);
    assert!(transaction.confirmed_at.is_some());
}

#[tokio::test]
async fn test_replayed_confirmation_credits_once() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;
    let order = app
        .state
        .payment_service
        .create_order(user_id, "basic")
        .await
        .unwrap();
    let callback = confirmation(&order.id);

    let first = app
        .state
        .payment_service
        .confirm_payment(user_id, &callback)
        .await
        .unwrap();
    let replay = app
        .state
        .payment_service
        .confirm_payment(user_id, &callback)
        .await
        .unwrap();

    assert!(first.newly_credited);
    assert!(!replay.newly_credited);
    assert_eq!(replay.credit_balance, 100);
    assert_eq!(app.balance(user_id).await, 100);
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;
    let order = app
        .state
        .payment_service
        .create_order(user_id, "basic")
        .await
        .unwrap();

    let mut callback = confirmation(&order.id);
    callback.razorpay_payment_id = "pay_forged".to_string();

    let err = app
        .state
        .payment_service
        .confirm_payment(user_id, &callback)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::VerificationFailed(_)));
    assert_eq!(app.balance(user_id).await, 0);
    let transaction = app
        .store
        .find_by_order_id(&order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!transaction.payment);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;

    let err = app
        .state
        .payment_service
        .confirm_payment(user_id, &confirmation("order_doesnotexist"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_cannot_confirm_another_users_order() {
    let app = TestApp::new();
    let owner = app.user_with_credits(0).await;
    let intruder = app.user_with_credits(0).await;
    let order = app
        .state
        .payment_service
        .create_order(owner, "advanced")
        .await
        .unwrap();

    let err = app
        .state
        .payment_service
        .confirm_payment(intruder, &confirmation(&order.id))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(app.balance(owner).await, 0);
    assert_eq!(app.balance(intruder).await, 0);
}

#[tokio::test]
async fn test_order_for_unknown_user_is_not_found() {
    let app = TestApp::new();

    let err = app
        .state
        .payment_service
        .create_order(Uuid::new_v4(), "basic")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(app.store.transaction_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_confirmations_credit_once() {
    let app = TestApp::new();
    let user_id = app.user_with_credits(0).await;
    let order = app
        .state
        .payment_service
        .create_order(user_id, "advanced")
        .await
        .unwrap();
    let service = Arc::clone(&app.state.payment_service);
    let callback = confirmation(&order.id);

    // Spawn 8 concurrent confirmations of the SAME order
    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let service = service.clone();
        let callback = callback.clone();
        tasks.spawn(async move { service.confirm_payment(user_id, &callback).await });
    }

    let mut credited_count = 0;
    while let Some(joined) = tasks.join_next().await {
        let confirmed = joined.unwrap().unwrap();
        if confirmed.newly_credited {
            credited_count += 1;
        }
    }

    assert_eq!(credited_count, 1);
    assert_eq!(app.balance(user_id).await, 500);
}
