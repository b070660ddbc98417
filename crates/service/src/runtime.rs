//! Runtime wiring: pick a storage backend and build every repository on it.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::audit::{AuditRepository, MemoryAuditRepository, SeaOrmAuditRepository};
use crate::auth::repo::SeaOrmAuthRepository;
use crate::auth::repository::memory::MemoryAuthRepository;
use crate::auth::AuthRepository;
use crate::category::{CategoryRepository, MemoryCategoryRepository, SeaOrmCategoryRepository};
use crate::comment::{CommentRepository, MemoryCommentRepository, SeaOrmCommentRepository};
use crate::contract::{ContractRepository, MemoryContractRepository, SeaOrmContractRepository};
use crate::events::{EventRepository, MemoryEventRepository, SeaOrmEventRepository};
use crate::news::{MemoryNewsRepository, NewsRepository, SeaOrmNewsRepository};
use crate::order::{MemoryOrderRepository, OrderRepository, SeaOrmOrderRepository};
use crate::product::{MemoryProductRepository, ProductRepository, SeaOrmProductRepository};
use crate::storage::memory::MemoryTable;
use crate::subscriber::{MemorySubscriberRepository, SeaOrmSubscriberRepository, SubscriberRepository};

/// Ensure expected directories exist; warn on missing optional ones.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(frontend_dir, data_dir).await
}

/// One handle per table, behind the repository traits.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<dyn CategoryRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub events: Arc<dyn EventRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub contracts: Arc<dyn ContractRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub auth: Arc<dyn AuthRepository>,
}

impl Repositories {
    pub fn postgres(db: DatabaseConnection) -> Self {
        Self {
            categories: Arc::new(SeaOrmCategoryRepository::new(db.clone())),
            news: Arc::new(SeaOrmNewsRepository::new(db.clone())),
            events: Arc::new(SeaOrmEventRepository::new(db.clone())),
            subscribers: Arc::new(SeaOrmSubscriberRepository::new(db.clone())),
            products: Arc::new(SeaOrmProductRepository::new(db.clone())),
            comments: Arc::new(SeaOrmCommentRepository::new(db.clone())),
            orders: Arc::new(SeaOrmOrderRepository { db: db.clone() }),
            contracts: Arc::new(SeaOrmContractRepository::new(db.clone())),
            audit: Arc::new(SeaOrmAuditRepository::new(db.clone())),
            auth: Arc::new(SeaOrmAuthRepository { db }),
        }
    }

    /// Everything in process. Orders share the product table so checkout
    /// can reserve stock under one lock.
    pub fn memory() -> Self {
        let products: Arc<MemoryProductRepository> = Arc::new(MemoryTable::new("products"));
        Self {
            categories: Arc::new(MemoryCategoryRepository::new("categories")),
            news: Arc::new(MemoryNewsRepository::new("news")),
            events: Arc::new(MemoryEventRepository::new("events")),
            subscribers: Arc::new(MemorySubscriberRepository::new("subscribers")),
            products: products.clone(),
            comments: Arc::new(MemoryCommentRepository::new("comments")),
            orders: Arc::new(MemoryOrderRepository::new(products)),
            contracts: Arc::new(MemoryContractRepository::new("contracts")),
            audit: Arc::new(MemoryAuditRepository::new("audit_log")),
            auth: Arc::new(MemoryAuthRepository::default()),
        }
    }
}
