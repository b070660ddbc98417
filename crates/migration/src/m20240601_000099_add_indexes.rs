use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &[&str])] = &[
    ("idx_users_tenant", "users", &["tenant_id"]),
    ("idx_categories_type_order", "categories", &["type", "order_index"]),
    ("idx_categories_parent", "categories", &["parent_id"]),
    ("idx_subscribers_profile_plan", "subscribers", &["profile_type", "plan_type"]),
    ("idx_news_published", "news", &["is_published", "published_at"]),
    ("idx_events_starts_at", "events", &["starts_at"]),
    ("idx_products_subscriber", "products", &["subscriber_id", "is_active"]),
    ("idx_comments_target", "comments", &["target_type", "target_id", "status"]),
    ("idx_orders_subscriber", "orders", &["subscriber_id"]),
    ("idx_order_items_order", "order_items", &["order_id"]),
    ("idx_contracts_subscriber", "contracts", &["subscriber_id"]),
    ("idx_audit_log_created", "audit_log", &["created_at"]),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, cols) in INDEXES {
            let mut idx = Index::create();
            idx.name(*name).table(Alias::new(*table)).if_not_exists();
            for c in cols.iter() {
                idx.col(Alias::new(*c));
            }
            manager.create_index(idx.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
