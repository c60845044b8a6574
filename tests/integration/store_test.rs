//! `SeaOrmStore` against an in-memory SQLite database with the real migrations

use imagify::{
    config::DatabaseConfig,
    store::{ConfirmOutcome, NewTransaction, NewUser, SeaOrmStore, TransactionStore, UserStore},
    ApiError,
};
use std::{path::PathBuf, sync::Arc};
use tokio::task::JoinSet;
use uuid::Uuid;

async fn setup_store() -> SeaOrmStore {
    SeaOrmStore::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        run_migrations: true,
    })
    .await
    .expect("Failed to open in-memory database")
}

/// File-backed database so the pool hands out several real connections
struct FileStore {
    store: Arc<SeaOrmStore>,
    path: PathBuf,
}

impl FileStore {
    async fn open() -> Self {
        let path = std::env::temp_dir().join(format!("imagify-{}.db", Uuid::new_v4()));
        let store = SeaOrmStore::connect(&DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            run_migrations: true,
        })
        .await
        .expect("Failed to open file database");

        Self {
            store: Arc::new(store),
            path,
        }
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

fn new_user(email: &str, credits: i32) -> NewUser {
    NewUser {
        name: "Store Test".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        credit_balance: credits,
    }
}

fn pending(user_id: Uuid, order_id: &str, credits: i32) -> NewTransaction {
    NewTransaction {
        id: Uuid::new_v4(),
        user_id,
        order_id: order_id.to_string(),
        plan: "basic".to_string(),
        amount: 1000,
        currency: "INR".to_string(),
        credits,
    }
}

#[tokio::test]
async fn test_user_round_trip_by_email() {
    let store = setup_store().await;
    let created = store.create_user(new_user("ada@example.com", 5)).await.unwrap();

    let found = store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.credit_balance, 5);

    assert!(store.find_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let store = setup_store().await;
    store.create_user(new_user("ada@example.com", 5)).await.unwrap();

    let err = store
        .create_user(new_user("ada@example.com", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_decrement_stops_at_zero() {
    let store = setup_store().await;
    let user = store.create_user(new_user("ada@example.com", 2)).await.unwrap();

    assert_eq!(store.decrement_if_positive(user.id).await.unwrap(), Some(1));
    assert_eq!(store.decrement_if_positive(user.id).await.unwrap(), Some(0));
    assert_eq!(store.decrement_if_positive(user.id).await.unwrap(), None);

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.credit_balance, 0);
}

#[tokio::test]
async fn test_decrement_unknown_user() {
    let store = setup_store().await;
    assert_eq!(store.decrement_if_positive(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_confirm_if_pending_credits_once() {
    let store = setup_store().await;
    let user = store.create_user(new_user("ada@example.com", 1)).await.unwrap();
    store
        .insert_pending(pending(user.id, "order_sqlite1", 100))
        .await
        .unwrap();

    let first = store.confirm_if_pending("order_sqlite1").await.unwrap();
    assert_eq!(
        first,
        ConfirmOutcome::Confirmed {
            user_id: user.id,
            credit_balance: 101
        }
    );

    let second = store.confirm_if_pending("order_sqlite1").await.unwrap();
    assert_eq!(second, ConfirmOutcome::AlreadyConfirmed { user_id: user.id });

    let user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.credit_balance, 101);

    let transaction = store
        .find_by_order_id("order_sqlite1")
        .await
        .unwrap()
        .unwrap();
    assert!(transaction.payment);
    assert!(transaction.confirmed_at.is_some());
}

#[tokio::test]
async fn test_confirm_unknown_order_is_missing() {
    let store = setup_store().await;
    assert_eq!(
        store.confirm_if_pending("order_nope").await.unwrap(),
        ConfirmOutcome::Missing
    );
}

#[tokio::test]
async fn test_duplicate_order_id_is_conflict() {
    let store = setup_store().await;
    let user = store.create_user(new_user("ada@example.com", 0)).await.unwrap();
    store
        .insert_pending(pending(user.id, "order_dup", 100))
        .await
        .unwrap();

    let err = store
        .insert_pending(pending(user.id, "order_dup", 100))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decrements_take_last_credit_once() {
    let db = FileStore::open().await;
    let user = db
        .store
        .create_user(new_user("race@example.com", 1))
        .await
        .unwrap();
    let user_id = user.id;

    // Spawn 16 concurrent debits against a single remaining credit
    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let store = db.store.clone();
        tasks.spawn(async move { store.decrement_if_positive(user_id).await });
    }

    let mut debited_count = 0;
    let mut refused_count = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(Some(balance)) => {
                assert_eq!(balance, 0);
                debited_count += 1;
            }
            Ok(None) => refused_count += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(debited_count, 1);
    assert_eq!(refused_count, 15);
    let user = db.store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.credit_balance, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirmations_credit_once() {
    let db = FileStore::open().await;
    let user = db
        .store
        .create_user(new_user("race@example.com", 0))
        .await
        .unwrap();
    db.store
        .insert_pending(pending(user.id, "order_race", 100))
        .await
        .unwrap();

    // Spawn 16 concurrent confirmations of the SAME order
    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let store = db.store.clone();
        tasks.spawn(async move { store.confirm_if_pending("order_race").await });
    }

    let mut confirmed_count = 0;
    let mut already_count = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(ConfirmOutcome::Confirmed { credit_balance, .. }) => {
                assert_eq!(credit_balance, 100);
                confirmed_count += 1;
            }
            Ok(ConfirmOutcome::AlreadyConfirmed { user_id }) => {
                assert_eq!(user_id, user.id);
                already_count += 1;
            }
            Ok(ConfirmOutcome::Missing) => panic!("order disappeared"),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(confirmed_count, 1);
    assert_eq!(already_count, 15);
    let user = db.store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.credit_balance, 100);
}
