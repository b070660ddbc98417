//! Create `products` table.
//!
//! Store items owned by a subscriber. Prices are integer cents.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(uuid(Products::Id).primary_key())
                    .col(uuid(Products::SubscriberId).not_null())
                    .col(string_len(Products::Name, 160).not_null())
                    .col(string_len(Products::Slug, 160).unique_key().not_null())
                    .col(text_null(Products::Description))
                    .col(big_integer(Products::PriceCents).not_null())
                    .col(big_integer_null(Products::PromoPriceCents))
                    .col(boolean(Products::IsPromotion).not_null().default(false))
                    .col(integer(Products::Stock).not_null().default(0))
                    .col(json_binary(Products::Tags).not_null().default(Expr::cust("'[]'::jsonb")))
                    .col(boolean(Products::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Products::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Products::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_subscriber")
                            .from(Products::Table, Products::SubscriberId)
                            .to(Subscribers::Table, Subscribers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Products::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table, Id, SubscriberId, Name, Slug, Description, PriceCents, PromoPriceCents,
    IsPromotion, Stock, Tags, IsActive, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Subscribers { Table, Id }
