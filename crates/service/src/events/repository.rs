use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::event;

use crate::content::ContentFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::schema::TolerantTable;
use crate::slug::SlugLookup;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait EventRepository: TolerantTable<event::Model> + SlugLookup {
    async fn get(&self, id: Uuid) -> Result<Option<event::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<event::Model>, ServiceError>;
    /// Soonest first.
    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<event::Model>, ServiceError>;
    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError>;
}

pub type SeaOrmEventRepository = SeaOrmTable<event::Model>;

#[async_trait]
impl EventRepository for SeaOrmEventRepository {
    async fn get(&self, id: Uuid) -> Result<Option<event::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<event::Model>, ServiceError> {
        self.by_slug(slug).await
    }

    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<event::Model>, ServiceError> {
        let mut q = event::Entity::find();
        if let Some(tid) = filter.tenant_id {
            q = q.filter(event::Column::TenantId.eq(tid));
        }
        if let Some(cid) = filter.category_id {
            q = q.filter(event::Column::CategoryId.eq(cid));
        }
        if !filter.include_drafts {
            q = q.filter(event::Column::IsPublished.eq(true)).filter(event::Column::IsActive.eq(true));
        }
        if filter.upcoming {
            let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
            // COALESCE(ends_at, starts_at) >= now
            q = q.filter(
                Expr::expr(Func::coalesce([
                    Expr::col(event::Column::EndsAt).into(),
                    Expr::col(event::Column::StartsAt).into(),
                ]))
                .gte(now),
            );
        }
        let (idx, per) = page.normalize();
        Ok(q.order_by_asc(event::Column::StartsAt)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.increment(id, "views").await
    }
}

pub type MemoryEventRepository = MemoryTable<event::Model>;

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn get(&self, id: Uuid) -> Result<Option<event::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<event::Model>, ServiceError> {
        Ok(self.find_one(|e| e.slug == slug).await)
    }

    async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<event::Model>, ServiceError> {
        let now = Utc::now();
        let mut rows = self
            .filter(|e| {
                filter.admits(e.tenant_id, e.category_id, e.is_published, e.is_active)
                    && (!filter.upcoming || e.ends_at.unwrap_or(e.starts_at) >= now)
            })
            .await?;
        rows.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(page.slice(rows))
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.modify(id, |e| e.views += 1).await.is_some())
    }
}
