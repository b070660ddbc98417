//! Create `events` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(uuid(Events::Id).primary_key())
                    .col(uuid_null(Events::TenantId))
                    .col(uuid_null(Events::AuthorId))
                    .col(uuid_null(Events::CategoryId))
                    .col(string_len(Events::Title, 255).not_null())
                    .col(string_len(Events::Slug, 160).unique_key().not_null())
                    .col(text(Events::Description).not_null())
                    .col(string_null(Events::Location))
                    .col(string_null(Events::CoverImage))
                    .col(timestamp_with_time_zone(Events::StartsAt).not_null())
                    .col(timestamp_with_time_zone_null(Events::EndsAt))
                    .col(json_binary(Events::Gallery).not_null().default(Expr::cust("'[]'::jsonb")))
                    .col(boolean(Events::IsPublished).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Events::PublishedAt))
                    .col(big_integer(Events::Views).not_null().default(0i64))
                    .col(boolean(Events::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Events::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Events::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_tenant")
                            .from(Events::Table, Events::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_author")
                            .from(Events::Table, Events::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_category")
                            .from(Events::Table, Events::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Events::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table, Id, TenantId, AuthorId, CategoryId, Title, Slug, Description, Location, CoverImage,
    StartsAt, EndsAt, Gallery, IsPublished, PublishedAt, Views, IsActive, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Categories { Table, Id }
