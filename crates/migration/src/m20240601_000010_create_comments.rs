//! Create `comments` table.
//!
//! Polymorphic target (`target_type` + `target_id`), so no FK on the target.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(uuid(Comments::Id).primary_key())
                    .col(string_len(Comments::TargetType, 16).not_null())
                    .col(uuid(Comments::TargetId).not_null())
                    .col(string_len(Comments::AuthorName, 128).not_null())
                    .col(string_len(Comments::AuthorEmail, 255).not_null())
                    .col(text(Comments::Body).not_null())
                    .col(string_len(Comments::Status, 16).not_null().default("pending"))
                    .col(timestamp_with_time_zone_null(Comments::ModeratedAt))
                    .col(timestamp_with_time_zone(Comments::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Comments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Comments { Table, Id, TargetType, TargetId, AuthorName, AuthorEmail, Body, Status, ModeratedAt, CreatedAt }
