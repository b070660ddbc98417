use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::{comment, CommentStatus, CommentTarget};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<comment::Model>, ServiceError>;
    async fn insert_comment(&self, row: &comment::Model) -> Result<(), ServiceError>;
    async fn save_comment(&self, row: &comment::Model) -> Result<(), ServiceError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, ServiceError>;
    /// Oldest first, as a conversation reads.
    async fn list_for_target(
        &self,
        target: CommentTarget,
        target_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<comment::Model>, ServiceError>;
    /// Oldest first so the queue drains in arrival order.
    async fn list_by_status(&self, status: CommentStatus, page: Pagination) -> Result<Vec<comment::Model>, ServiceError>;
}

pub type SeaOrmCommentRepository = SeaOrmTable<comment::Model>;

#[async_trait]
impl CommentRepository for SeaOrmCommentRepository {
    async fn get(&self, id: Uuid) -> Result<Option<comment::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn insert_comment(&self, row: &comment::Model) -> Result<(), ServiceError> {
        self.insert(row).await
    }

    async fn save_comment(&self, row: &comment::Model) -> Result<(), ServiceError> {
        if !self.update(row).await? {
            return Err(ServiceError::not_found("comment"));
        }
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.delete(id).await
    }

    async fn list_for_target(
        &self,
        target: CommentTarget,
        target_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<comment::Model>, ServiceError> {
        Ok(comment::Entity::find()
            .filter(comment::Column::TargetType.eq(target.as_str()))
            .filter(comment::Column::TargetId.eq(target_id))
            .filter(comment::Column::Status.eq(status.as_str()))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db())
            .await?)
    }

    async fn list_by_status(&self, status: CommentStatus, page: Pagination) -> Result<Vec<comment::Model>, ServiceError> {
        let (idx, per) = page.normalize();
        Ok(comment::Entity::find()
            .filter(comment::Column::Status.eq(status.as_str()))
            .order_by_asc(comment::Column::CreatedAt)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }
}

pub type MemoryCommentRepository = MemoryTable<comment::Model>;

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn get(&self, id: Uuid) -> Result<Option<comment::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn insert_comment(&self, row: &comment::Model) -> Result<(), ServiceError> {
        self.insert(row.clone()).await
    }

    async fn save_comment(&self, row: &comment::Model) -> Result<(), ServiceError> {
        if !self.replace(row.clone()).await? {
            return Err(ServiceError::not_found("comment"));
        }
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.remove(id).await)
    }

    async fn list_for_target(
        &self,
        target: CommentTarget,
        target_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<comment::Model>, ServiceError> {
        let mut rows = self
            .filter(|c| c.target_type == target.as_str() && c.target_id == target_id && c.status == status.as_str())
            .await?;
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn list_by_status(&self, status: CommentStatus, page: Pagination) -> Result<Vec<comment::Model>, ServiceError> {
        let mut rows = self.filter(|c| c.status == status.as_str()).await?;
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(page.slice(rows))
    }
}
