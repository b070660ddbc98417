//! Create `audit_log` table.
//!
//! Append-only record of admin actions; `actor_id` survives user deletion as NULL.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(uuid(AuditLog::Id).primary_key())
                    .col(uuid_null(AuditLog::ActorId))
                    .col(string_len(AuditLog::Action, 64).not_null())
                    .col(string_len(AuditLog::Entity, 64).not_null())
                    .col(uuid_null(AuditLog::EntityId))
                    .col(json_binary(AuditLog::Details).not_null().default(Expr::cust("'{}'::jsonb")))
                    .col(timestamp_with_time_zone(AuditLog::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_log_actor")
                            .from(AuditLog::Table, AuditLog::ActorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog { Table, Id, ActorId, Action, Entity, EntityId, Details, CreatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
