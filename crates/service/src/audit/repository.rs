use async_trait::async_trait;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};

use models::audit_log;

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, row: &audit_log::Model) -> Result<(), ServiceError>;
    /// Newest first.
    async fn recent(&self, page: Pagination) -> Result<Vec<audit_log::Model>, ServiceError>;
}

pub type SeaOrmAuditRepository = SeaOrmTable<audit_log::Model>;

#[async_trait]
impl AuditRepository for SeaOrmAuditRepository {
    async fn append(&self, row: &audit_log::Model) -> Result<(), ServiceError> {
        self.insert(row).await
    }

    async fn recent(&self, page: Pagination) -> Result<Vec<audit_log::Model>, ServiceError> {
        let (idx, per) = page.normalize();
        Ok(audit_log::Entity::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }
}

pub type MemoryAuditRepository = MemoryTable<audit_log::Model>;

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn append(&self, row: &audit_log::Model) -> Result<(), ServiceError> {
        self.insert(row.clone()).await
    }

    async fn recent(&self, page: Pagination) -> Result<Vec<audit_log::Model>, ServiceError> {
        let mut rows = self.filter(|_| true).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(rows))
    }
}
