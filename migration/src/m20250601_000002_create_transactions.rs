use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250601_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Transactions::Id))
                    .col(uuid(Transactions::UserId).not_null())
                    .col(string(Transactions::OrderId).not_null().unique_key())
                    .col(string(Transactions::Plan).not_null())
                    .col(big_integer(Transactions::Amount).not_null())
                    .col(string(Transactions::Currency).not_null())
                    .col(integer(Transactions::Credits).not_null())
                    .col(boolean(Transactions::Payment).not_null().default(false))
                    .col(
                        timestamp_with_time_zone(Transactions::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone_null(Transactions::ConfirmedAt))
                    // Lookup-only reference: users are never deleted, so no cascade
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    UserId,
    OrderId,
    Plan,
    Amount,
    Currency,
    Credits,
    Payment,
    CreatedAt,
    ConfirmedAt,
}
