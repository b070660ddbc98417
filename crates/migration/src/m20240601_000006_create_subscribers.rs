//! Create `subscribers` table.
//!
//! Businesses and professionals listed on the portal. Never hard-deleted;
//! `status` carries the soft-delete flag.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscribers::Table)
                    .if_not_exists()
                    .col(uuid(Subscribers::Id).primary_key())
                    .col(uuid_null(Subscribers::TenantId))
                    .col(uuid_null(Subscribers::UserId).unique_key())
                    .col(string_len(Subscribers::Name, 160).not_null())
                    .col(string_len(Subscribers::Email, 255).not_null())
                    .col(string_len_null(Subscribers::Phone, 32))
                    .col(string_len(Subscribers::ProfileType, 32).not_null())
                    .col(string_len(Subscribers::PlanType, 32).not_null().default("gratuito"))
                    .col(string_len(Subscribers::Status, 16).not_null().default("active"))
                    .col(uuid_null(Subscribers::CategoryId))
                    .col(string_len(Subscribers::Slug, 160).unique_key().not_null())
                    .col(text_null(Subscribers::Description))
                    .col(big_integer(Subscribers::Views).not_null().default(0i64))
                    .col(timestamp_with_time_zone(Subscribers::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Subscribers::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscribers_tenant")
                            .from(Subscribers::Table, Subscribers::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscribers_user")
                            .from(Subscribers::Table, Subscribers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscribers_category")
                            .from(Subscribers::Table, Subscribers::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Subscribers::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Subscribers {
    Table, Id, TenantId, UserId, Name, Email, Phone, ProfileType, PlanType, Status,
    CategoryId, Slug, Description, Views, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Categories { Table, Id }
