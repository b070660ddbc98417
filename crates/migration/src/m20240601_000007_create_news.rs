//! Create `news` table.
//!
//! Articles with a unique slug, JSON gallery and related links, publish flag
//! and a monotonically increasing view counter.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(News::Table)
                    .if_not_exists()
                    .col(uuid(News::Id).primary_key())
                    .col(uuid_null(News::TenantId))
                    .col(uuid_null(News::AuthorId))
                    .col(uuid_null(News::CategoryId))
                    .col(string_len(News::Title, 255).not_null())
                    .col(string_len(News::Slug, 160).unique_key().not_null())
                    .col(text_null(News::Excerpt))
                    .col(text(News::Content).not_null())
                    .col(string_null(News::CoverImage))
                    .col(json_binary(News::Gallery).not_null().default(Expr::cust("'[]'::jsonb")))
                    .col(json_binary(News::RelatedLinks).not_null().default(Expr::cust("'[]'::jsonb")))
                    .col(boolean(News::IsPublished).not_null().default(false))
                    .col(timestamp_with_time_zone_null(News::PublishedAt))
                    .col(big_integer(News::Views).not_null().default(0i64))
                    .col(boolean(News::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(News::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(News::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_tenant")
                            .from(News::Table, News::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_author")
                            .from(News::Table, News::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_category")
                            .from(News::Table, News::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(News::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum News {
    Table, Id, TenantId, AuthorId, CategoryId, Title, Slug, Excerpt, Content, CoverImage,
    Gallery, RelatedLinks, IsPublished, PublishedAt, Views, IsActive, CreatedAt, UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Categories { Table, Id }
