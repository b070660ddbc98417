//! Create `categories` table.
//!
//! Shared taxonomy for directories, news, events, jobs and forum. `parent_id`
//! allows one level of nesting.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(uuid(Categories::Id).primary_key())
                    .col(string_len(Categories::Name, 128).not_null())
                    .col(string_len(Categories::Slug, 160).unique_key().not_null())
                    .col(string_len_null(Categories::Type, 32))
                    .col(uuid_null(Categories::ParentId))
                    .col(integer(Categories::OrderIndex).not_null().default(0))
                    .col(boolean(Categories::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Categories::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Categories::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Categories::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Categories { Table, Id, Name, Slug, Type, ParentId, OrderIndex, IsActive, CreatedAt, UpdatedAt }
