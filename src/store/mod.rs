//! Data-access interface for users and purchase transactions
//!
//! Credit mutations are exposed only as atomic conditional operations
//! (`decrement_if_positive`, `confirm_if_pending`), so callers never
//! read a balance and write it back.

pub mod memory;
pub mod sea_orm_store;

use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sea_orm_store::SeaOrmStore;

pub type User = entity::users::Model;
pub type Transaction = entity::transactions::Model;

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub credit_balance: i32,
}

/// A purchase awaiting gateway confirmation
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub plan: String,
    pub amount: i64,
    pub currency: String,
    pub credits: i32,
}

/// Result of `TransactionStore::confirm_if_pending`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// This call flipped the flag and credited the user
    Confirmed { user_id: Uuid, credit_balance: i32 },
    /// The transaction was confirmed earlier; nothing changed
    AlreadyConfirmed { user_id: Uuid },
    /// No transaction carries this order id
    Missing,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `Conflict` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Decrement the balance by one where it is positive.
    ///
    /// Returns the new balance, or `None` when the user has no credit left
    /// (or does not exist). Never observes a negative balance.
    async fn decrement_if_positive(&self, user_id: Uuid) -> Result<Option<i32>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert_pending(&self, transaction: NewTransaction) -> Result<Transaction>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>>;

    /// Flip `payment` to true where it is still false, and in the same unit
    /// add the transaction's credits to its user. At most one caller per
    /// order id ever sees `Confirmed`.
    async fn confirm_if_pending(&self, order_id: &str) -> Result<ConfirmOutcome>;
}
