use super::{ConfirmOutcome, NewTransaction, NewUser, Transaction, TransactionStore, User, UserStore};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store used for local development (`database.url = "memory://"`)
/// and tests. Every mutation runs under one write lock, so check-and-update
/// pairs are atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    // keyed by gateway order id
    transactions: HashMap<String, Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transactions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let model = User {
            id: Uuid::now_v7(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            credit_balance: user.credit_balance,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(model.id, model.clone());

        Ok(model)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn decrement_if_positive(&self, user_id: Uuid) -> Result<Option<i32>> {
        let mut inner = self.inner.write().await;

        match inner.users.get_mut(&user_id) {
            Some(user) if user.credit_balance > 0 => {
                user.credit_balance -= 1;
                user.updated_at = OffsetDateTime::now_utc();
                Ok(Some(user.credit_balance))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert_pending(&self, transaction: NewTransaction) -> Result<Transaction> {
        let mut inner = self.inner.write().await;

        if inner.transactions.contains_key(&transaction.order_id) {
            return Err(ApiError::Conflict("Order already recorded".to_string()));
        }

        let model = Transaction {
            id: transaction.id,
            user_id: transaction.user_id,
            order_id: transaction.order_id,
            plan: transaction.plan,
            amount: transaction.amount,
            currency: transaction.currency,
            credits: transaction.credits,
            payment: false,
            created_at: OffsetDateTime::now_utc(),
            confirmed_at: None,
        };
        inner
            .transactions
            .insert(model.order_id.clone(), model.clone());

        Ok(model)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>> {
        Ok(self.inner.read().await.transactions.get(order_id).cloned())
    }

    async fn confirm_if_pending(&self, order_id: &str) -> Result<ConfirmOutcome> {
        let mut inner = self.inner.write().await;
        let Inner {
            users,
            transactions,
        } = &mut *inner;

        let Some(transaction) = transactions.get_mut(order_id) else {
            return Ok(ConfirmOutcome::Missing);
        };

        if transaction.payment {
            return Ok(ConfirmOutcome::AlreadyConfirmed {
                user_id: transaction.user_id,
            });
        }

        // Check the user before flipping so a failure leaves both records untouched
        let user = users
            .get_mut(&transaction.user_id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let now = OffsetDateTime::now_utc();
        transaction.payment = true;
        transaction.confirmed_at = Some(now);
        user.credit_balance += transaction.credits;
        user.updated_at = now;

        Ok(ConfirmOutcome::Confirmed {
            user_id: user.id,
            credit_balance: user.credit_balance,
        })
    }
}
