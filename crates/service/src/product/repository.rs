use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::product;

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::slug::SlugLookup;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait ProductRepository: SlugLookup {
    async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<product::Model>, ServiceError>;
    async fn insert_product(&self, row: &product::Model) -> Result<(), ServiceError>;
    async fn save_product(&self, row: &product::Model) -> Result<(), ServiceError>;
    /// Newest first.
    async fn list_for_subscriber(&self, subscriber_id: Uuid, include_inactive: bool) -> Result<Vec<product::Model>, ServiceError>;
    /// Active products flagged as promotions, newest first.
    async fn list_promotions(&self, page: Pagination) -> Result<Vec<product::Model>, ServiceError>;
    async fn count_active(&self, subscriber_id: Uuid) -> Result<u64, ServiceError>;
}

pub type SeaOrmProductRepository = SeaOrmTable<product::Model>;

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<product::Model>, ServiceError> {
        self.by_slug(slug).await
    }

    async fn insert_product(&self, row: &product::Model) -> Result<(), ServiceError> {
        self.insert(row).await
    }

    async fn save_product(&self, row: &product::Model) -> Result<(), ServiceError> {
        if !self.update(row).await? {
            return Err(ServiceError::not_found("product"));
        }
        Ok(())
    }

    async fn list_for_subscriber(&self, subscriber_id: Uuid, include_inactive: bool) -> Result<Vec<product::Model>, ServiceError> {
        let mut q = product::Entity::find().filter(product::Column::SubscriberId.eq(subscriber_id));
        if !include_inactive {
            q = q.filter(product::Column::IsActive.eq(true));
        }
        Ok(q.order_by_desc(product::Column::CreatedAt).all(self.db()).await?)
    }

    async fn list_promotions(&self, page: Pagination) -> Result<Vec<product::Model>, ServiceError> {
        let (idx, per) = page.normalize();
        Ok(product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::IsPromotion.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }

    async fn count_active(&self, subscriber_id: Uuid) -> Result<u64, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::SubscriberId.eq(subscriber_id))
            .filter(product::Column::IsActive.eq(true))
            .count(self.db())
            .await?)
    }
}

pub type MemoryProductRepository = MemoryTable<product::Model>;

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<product::Model>, ServiceError> {
        Ok(self.find_one(|p| p.slug == slug).await)
    }

    async fn insert_product(&self, row: &product::Model) -> Result<(), ServiceError> {
        self.insert(row.clone()).await
    }

    async fn save_product(&self, row: &product::Model) -> Result<(), ServiceError> {
        if !self.replace(row.clone()).await? {
            return Err(ServiceError::not_found("product"));
        }
        Ok(())
    }

    async fn list_for_subscriber(&self, subscriber_id: Uuid, include_inactive: bool) -> Result<Vec<product::Model>, ServiceError> {
        let mut rows = self
            .filter(|p| p.subscriber_id == subscriber_id && (include_inactive || p.is_active))
            .await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_promotions(&self, page: Pagination) -> Result<Vec<product::Model>, ServiceError> {
        let mut rows = self.filter(|p| p.is_active && p.is_promotion).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(rows))
    }

    async fn count_active(&self, subscriber_id: Uuid) -> Result<u64, ServiceError> {
        self.count(|p| p.subscriber_id == subscriber_id && p.is_active).await
    }
}
