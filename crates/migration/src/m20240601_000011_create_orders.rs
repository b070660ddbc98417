//! Create `orders` and `order_items` tables.
//!
//! Items snapshot the product name and unit price at checkout time.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(uuid(Orders::Id).primary_key())
                    .col(uuid(Orders::SubscriberId).not_null())
                    .col(string_len(Orders::BuyerName, 128).not_null())
                    .col(string_len(Orders::BuyerEmail, 255).not_null())
                    .col(string_len_null(Orders::BuyerPhone, 32))
                    .col(text_null(Orders::ShippingAddress))
                    .col(string_len(Orders::PaymentMethod, 16).not_null())
                    .col(string_len(Orders::Status, 16).not_null().default("pending"))
                    .col(big_integer(Orders::TotalCents).not_null())
                    .col(timestamp_with_time_zone(Orders::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Orders::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_subscriber")
                            .from(Orders::Table, Orders::SubscriberId)
                            .to(Subscribers::Table, Subscribers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(uuid(OrderItems::Id).primary_key())
                    .col(uuid(OrderItems::OrderId).not_null())
                    .col(uuid(OrderItems::ProductId).not_null())
                    .col(string_len(OrderItems::ProductName, 160).not_null())
                    .col(big_integer(OrderItems::UnitPriceCents).not_null())
                    .col(integer(OrderItems::Quantity).not_null())
                    .col(big_integer(OrderItems::SubtotalCents).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_product")
                            .from(OrderItems::Table, OrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderItems::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table, Id, SubscriberId, BuyerName, BuyerEmail, BuyerPhone, ShippingAddress,
    PaymentMethod, Status, TotalCents, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems { Table, Id, OrderId, ProductId, ProductName, UnitPriceCents, Quantity, SubtotalCents }

#[derive(DeriveIden)]
enum Subscribers { Table, Id }

#[derive(DeriveIden)]
enum Products { Table, Id }
