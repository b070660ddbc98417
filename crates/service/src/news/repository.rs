use async_trait::async_trait;
use sea_orm::sea_query::NullOrdering;
use sea_orm::{ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::news;

use crate::content::ContentFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::schema::TolerantTable;
use crate::slug::SlugLookup;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait NewsRepository: TolerantTable<news::Model> + SlugLookup {
    async fn get(&self, id: Uuid) -> Result<Option<news::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<news::Model>, ServiceError>;
    /// Newest first.
    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<news::Model>, ServiceError>;
    /// Atomic `views = views + 1`; false when the row does not exist.
    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError>;
}

pub type SeaOrmNewsRepository = SeaOrmTable<news::Model>;

#[async_trait]
impl NewsRepository for SeaOrmNewsRepository {
    async fn get(&self, id: Uuid) -> Result<Option<news::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<news::Model>, ServiceError> {
        self.by_slug(slug).await
    }

    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<news::Model>, ServiceError> {
        let mut q = news::Entity::find();
        if let Some(tid) = filter.tenant_id {
            q = q.filter(news::Column::TenantId.eq(tid));
        }
        if let Some(cid) = filter.category_id {
            q = q.filter(news::Column::CategoryId.eq(cid));
        }
        if !filter.include_drafts {
            q = q.filter(news::Column::IsPublished.eq(true)).filter(news::Column::IsActive.eq(true));
        }
        let (idx, per) = page.normalize();
        Ok(q
            .order_by_with_nulls(news::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .order_by(news::Column::CreatedAt, Order::Desc)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.increment(id, "views").await
    }
}

pub type MemoryNewsRepository = MemoryTable<news::Model>;

#[async_trait]
impl NewsRepository for MemoryNewsRepository {
    async fn get(&self, id: Uuid) -> Result<Option<news::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<news::Model>, ServiceError> {
        Ok(self.find_one(|n| n.slug == slug).await)
    }

    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<news::Model>, ServiceError> {
        let mut rows = self
            .filter(|n| filter.admits(n.tenant_id, n.category_id, n.is_published, n.is_active))
            .await?;
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(page.slice(rows))
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.modify(id, |n| n.views += 1).await.is_some())
    }
}
