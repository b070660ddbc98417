//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_tenants;
mod m20240601_000002_create_users;
mod m20240601_000003_create_user_credentials;
mod m20240601_000004_create_password_reset_tokens;
mod m20240601_000005_create_categories;
mod m20240601_000006_create_subscribers;
mod m20240601_000007_create_news;
mod m20240601_000008_create_events;
mod m20240601_000009_create_products;
mod m20240601_000010_create_comments;
mod m20240601_000011_create_orders;
mod m20240601_000012_create_contracts;
mod m20240601_000013_create_audit_log;
mod m20240601_000099_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_tenants::Migration),
            Box::new(m20240601_000002_create_users::Migration),
            Box::new(m20240601_000003_create_user_credentials::Migration),
            Box::new(m20240601_000004_create_password_reset_tokens::Migration),
            Box::new(m20240601_000005_create_categories::Migration),
            Box::new(m20240601_000006_create_subscribers::Migration),
            Box::new(m20240601_000007_create_news::Migration),
            Box::new(m20240601_000008_create_events::Migration),
            Box::new(m20240601_000009_create_products::Migration),
            Box::new(m20240601_000010_create_comments::Migration),
            Box::new(m20240601_000011_create_orders::Migration),
            Box::new(m20240601_000012_create_contracts::Migration),
            Box::new(m20240601_000013_create_audit_log::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000099_add_indexes::Migration),
        ]
    }
}
