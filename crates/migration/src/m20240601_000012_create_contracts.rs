//! Create `contracts` table.
//!
//! Plan change requests and their activation state.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(uuid(Contracts::Id).primary_key())
                    .col(uuid(Contracts::SubscriberId).not_null())
                    .col(string_len(Contracts::FromPlan, 32).not_null())
                    .col(string_len(Contracts::ToPlan, 32).not_null())
                    .col(string_len(Contracts::PaymentMethod, 16).not_null())
                    .col(big_integer(Contracts::AmountCents).not_null())
                    .col(string_len(Contracts::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Contracts::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Contracts::ActivatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contracts_subscriber")
                            .from(Contracts::Table, Contracts::SubscriberId)
                            .to(Subscribers::Table, Subscribers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Contracts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Contracts {
    Table, Id, SubscriberId, FromPlan, ToPlan, PaymentMethod, AmountCents, Status, CreatedAt, ActivatedAt,
}

#[derive(DeriveIden)]
enum Subscribers { Table, Id }
