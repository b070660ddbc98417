use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use models::{subscriber, ProfileType, SubscriberStatus};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::schema::TolerantTable;
use crate::slug::SlugLookup;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DirectoryFilter {
    pub tenant_id: Option<Uuid>,
    pub profile_type: Option<ProfileType>,
    pub category_id: Option<Uuid>,
    #[serde(skip)]
    pub include_inactive: bool,
}

impl DirectoryFilter {
    fn admits(&self, s: &subscriber::Model) -> bool {
        (self.include_inactive || s.is_active())
            && self.tenant_id.map_or(true, |t| s.tenant_id == Some(t))
            && self.profile_type.map_or(true, |p| s.profile() == Some(p))
            && self.category_id.map_or(true, |c| s.category_id == Some(c))
    }
}

#[async_trait]
pub trait SubscriberRepository: TolerantTable<subscriber::Model> + SlugLookup {
    async fn get(&self, id: Uuid) -> Result<Option<subscriber::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<subscriber::Model>, ServiceError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<subscriber::Model>, ServiceError>;
    /// Alphabetical.
    async fn list(&self, filter: DirectoryFilter, page: Pagination) -> Result<Vec<subscriber::Model>, ServiceError>;
    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError>;
}

pub type SeaOrmSubscriberRepository = SeaOrmTable<subscriber::Model>;

#[async_trait]
impl SubscriberRepository for SeaOrmSubscriberRepository {
    async fn get(&self, id: Uuid) -> Result<Option<subscriber::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<subscriber::Model>, ServiceError> {
        self.by_slug(slug).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<subscriber::Model>, ServiceError> {
        self.find_by("user_id", user_id).await
    }

    async fn list(&self, filter: DirectoryFilter, page: Pagination) -> Result<Vec<subscriber::Model>, ServiceError> {
        let mut q = subscriber::Entity::find();
        if !filter.include_inactive {
            q = q.filter(subscriber::Column::Status.eq(SubscriberStatus::Active.as_str()));
        }
        if let Some(t) = filter.tenant_id {
            q = q.filter(subscriber::Column::TenantId.eq(t));
        }
        if let Some(p) = filter.profile_type {
            q = q.filter(subscriber::Column::ProfileType.eq(p.as_str()));
        }
        if let Some(c) = filter.category_id {
            q = q.filter(subscriber::Column::CategoryId.eq(c));
        }
        let (idx, per) = page.normalize();
        Ok(q.order_by_asc(subscriber::Column::Name)
            .paginate(self.db(), per)
            .fetch_page(idx)
            .await?)
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.increment(id, "views").await
    }
}

pub type MemorySubscriberRepository = MemoryTable<subscriber::Model>;

#[async_trait]
impl SubscriberRepository for MemorySubscriberRepository {
    async fn get(&self, id: Uuid) -> Result<Option<subscriber::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<subscriber::Model>, ServiceError> {
        Ok(self.find_one(|s| s.slug == slug).await)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<subscriber::Model>, ServiceError> {
        Ok(self.find_one(|s| s.user_id == Some(user_id)).await)
    }

    async fn list(&self, filter: DirectoryFilter, page: Pagination) -> Result<Vec<subscriber::Model>, ServiceError> {
        let mut rows = self.filter(|s| filter.admits(s)).await?;
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page.slice(rows))
    }

    async fn increment_views(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.modify(id, |s| s.views += 1).await.is_some())
    }
}
