use super::{ConfirmOutcome, NewTransaction, NewUser, Transaction, TransactionStore, User, UserStore};
use crate::{
    config::DatabaseConfig,
    error::{ApiError, Result},
};
use async_trait::async_trait;
use entity::{transactions, users};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectOptions, Database, DatabaseConnection, DbErr,
    SqlErr, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// sea-orm backed store (Postgres in production, SQLite in tests)
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect and, when configured, bring the schema up to date
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, DbErr> {
        let mut options = ConnectOptions::new(config.url.clone());
        options.sqlx_logging(false);
        if config.url.starts_with("sqlite::memory:") {
            // Every pooled connection would otherwise open its own empty database
            options.max_connections(1);
        }

        let db = Database::connect(options).await?;

        if config.run_migrations {
            Migrator::up(&db, None).await?;
            info!("Database migrations applied");
        }

        Ok(Self::new(db))
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = OffsetDateTime::now_utc();

        let new_user = users::ActiveModel {
            id: Set(Uuid::now_v7()), // Use UUID v7 for time-ordered IDs (better for DB indexing)
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            credit_balance: Set(user.credit_balance),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match users::Entity::insert(new_user)
            .exec_with_returning(&self.db)
            .await
        {
            Ok(user) => Ok(user),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ApiError::Conflict("User already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(users::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    async fn decrement_if_positive(&self, user_id: Uuid) -> Result<Option<i32>> {
        // Single conditional UPDATE: the balance check and the debit cannot interleave
        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::CreditBalance,
                Expr::col(users::Column::CreditBalance).sub(1),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(OffsetDateTime::now_utc()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::CreditBalance.gt(0))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.first().map(|user| user.credit_balance))
    }
}

#[async_trait]
impl TransactionStore for SeaOrmStore {
    #[instrument(skip(self, transaction), fields(order_id = %transaction.order_id))]
    async fn insert_pending(&self, transaction: NewTransaction) -> Result<Transaction> {
        let new_transaction = transactions::ActiveModel {
            id: Set(transaction.id),
            user_id: Set(transaction.user_id),
            order_id: Set(transaction.order_id),
            plan: Set(transaction.plan),
            amount: Set(transaction.amount),
            currency: Set(transaction.currency),
            credits: Set(transaction.credits),
            payment: Set(false),
            created_at: Set(OffsetDateTime::now_utc()),
            confirmed_at: Set(None),
        };

        match transactions::Entity::insert(new_transaction)
            .exec_with_returning(&self.db)
            .await
        {
            Ok(transaction) => Ok(transaction),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                ApiError::Conflict("Order already recorded".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::OrderId.eq(order_id))
            .one(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    async fn confirm_if_pending(&self, order_id: &str) -> Result<ConfirmOutcome> {
        let now = OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        // Compare-and-set on the confirmation flag; a concurrent duplicate blocks
        // on the row lock and then matches zero rows
        let flipped = transactions::Entity::update_many()
            .col_expr(transactions::Column::Payment, Expr::value(true))
            .col_expr(transactions::Column::ConfirmedAt, Expr::value(Some(now)))
            .filter(transactions::Column::OrderId.eq(order_id))
            .filter(transactions::Column::Payment.eq(false))
            .exec(&txn)
            .await?;

        let transaction = transactions::Entity::find()
            .filter(transactions::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?;

        let Some(transaction) = transaction else {
            txn.rollback().await?;
            return Ok(ConfirmOutcome::Missing);
        };

        if flipped.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(ConfirmOutcome::AlreadyConfirmed {
                user_id: transaction.user_id,
            });
        }

        let credited = users::Entity::update_many()
            .col_expr(
                users::Column::CreditBalance,
                Expr::col(users::Column::CreditBalance).add(transaction.credits),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(transaction.user_id))
            .exec_with_returning(&txn)
            .await?;

        let Some(user) = credited.into_iter().next() else {
            warn!(
                order_id = order_id,
                user_id = %transaction.user_id,
                "Transaction references a missing user"
            );
            txn.rollback().await?;
            return Err(ApiError::NotFound("User not found".to_string()));
        };

        txn.commit().await?;

        info!(
            order_id = order_id,
            user_id = %user.id,
            credits = transaction.credits,
            credit_balance = user.credit_balance,
            "Transaction confirmed and credits granted"
        );

        Ok(ConfirmOutcome::Confirmed {
            user_id: user.id,
            credit_balance: user.credit_balance,
        })
    }
}
