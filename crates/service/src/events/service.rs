use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::event;

use super::repository::EventRepository;
use crate::content::ContentFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::schema::{insert_tolerant, update_tolerant};
use crate::slug::insert_with_unique_slug;

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: Option<DateTimeWithTimeZone>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub publish: bool,
}

impl EventInput {
    fn apply(&self, row: &mut event::Model) -> Result<(), ServiceError> {
        row.title = self.title.trim().to_string();
        row.description = self.description.clone();
        row.location = self.location.clone();
        row.cover_image = self.cover_image.clone();
        row.category_id = self.category_id;
        row.starts_at = self.starts_at;
        row.ends_at = self.ends_at;
        row.gallery = serde_json::to_value(&self.gallery).map_err(|e| ServiceError::Validation(e.to_string()))?;
        Ok(())
    }
}

pub struct EventService<R: EventRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: EventRepository + ?Sized> EventService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn get(&self, id: Uuid) -> Result<event::Model, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("event"))
    }

    pub async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<event::Model>, ServiceError> {
        self.repo.list(filter, page).await
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(
        &self,
        tenant_id: Option<Uuid>,
        author_id: Option<Uuid>,
        input: EventInput,
    ) -> Result<event::Model, ServiceError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut template = event::Model {
            id: Uuid::nil(),
            tenant_id,
            author_id,
            category_id: None,
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            location: None,
            cover_image: None,
            starts_at: input.starts_at,
            ends_at: None,
            gallery: serde_json::json!([]),
            is_published: input.publish,
            published_at: input.publish.then_some(now),
            views: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        input.apply(&mut template)?;
        event::validate(&template)?;

        let created = insert_with_unique_slug(&*self.repo, "events", &input.title, |slug| {
            let row = event::Model { id: Uuid::new_v4(), slug, ..template.clone() };
            let repo = self.repo.clone();
            async move { insert_tolerant(&*repo, row).await }
        })
        .await?;
        info!(id = %created.id, slug = %created.slug, starts_at = %created.starts_at, "event created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: EventInput) -> Result<event::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        input.apply(&mut next)?;
        if input.publish && !next.is_published {
            next.is_published = true;
            next.published_at = next.published_at.or_else(|| Some(Utc::now().into()));
        }
        next.updated_at = Utc::now().into();
        event::validate(&next)?;
        update_tolerant(&*self.repo, &current, next).await
    }

    #[instrument(skip(self))]
    pub async fn set_published(&self, id: Uuid, published: bool) -> Result<event::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.is_published = published;
        if published && next.published_at.is_none() {
            next.published_at = Some(Utc::now().into());
        }
        next.updated_at = Utc::now().into();
        update_tolerant(&*self.repo, &current, next).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug_and_count_view(&self, slug: &str) -> Result<event::Model, ServiceError> {
        let found = self
            .repo
            .find_by_slug(slug)
            .await?
            .filter(|e| e.is_published && e.is_active)
            .ok_or_else(|| ServiceError::not_found("event"))?;
        self.repo.increment_views(found.id).await?;
        common::metrics::record_view("event");
        Ok(self.repo.get(found.id).await?.unwrap_or(event::Model { views: found.views + 1, ..found }))
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.is_active = false;
        next.is_published = false;
        next.updated_at = Utc::now().into();
        update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, "event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryEventRepository;
    use crate::storage::memory::MemoryTable;
    use chrono::Duration;

    fn svc() -> (Arc<MemoryEventRepository>, EventService<MemoryEventRepository>) {
        let repo = Arc::new(MemoryTable::new("events"));
        (repo.clone(), EventService::new(repo))
    }

    fn input(title: &str, days_from_now: i64) -> EventInput {
        let starts = Utc::now() + Duration::days(days_from_now);
        EventInput {
            title: title.into(),
            description: "Programação completa".into(),
            location: Some("Praça Central".into()),
            cover_image: None,
            category_id: None,
            starts_at: starts.into(),
            ends_at: Some((starts + Duration::hours(3)).into()),
            gallery: vec![],
            publish: true,
        }
    }

    #[tokio::test]
    async fn upcoming_listing_is_ordered_and_skips_past_events() {
        let (_, svc) = svc();
        svc.create(None, None, input("Festival de Inverno", 10)).await.unwrap();
        svc.create(None, None, input("Carnaval", -30)).await.unwrap();
        svc.create(None, None, input("Feira do Livro", 2)).await.unwrap();

        let filter = ContentFilter { upcoming: true, ..ContentFilter::public() };
        let titles: Vec<_> = svc.list(filter, Pagination::default()).await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Feira do Livro", "Festival de Inverno"]);
    }

    #[tokio::test]
    async fn rejects_end_before_start() {
        let (_, svc) = svc();
        let mut bad = input("Corrida", 1);
        bad.ends_at = Some((Utc::now() - Duration::days(1)).into());
        assert!(matches!(svc.create(None, None, bad).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn detail_counts_views() {
        let (_, svc) = svc();
        let e = svc.create(None, None, input("Cinema ao ar livre", 5)).await.unwrap();
        let first = svc.get_by_slug_and_count_view(&e.slug).await.unwrap();
        let second = svc.get_by_slug_and_count_view(&e.slug).await.unwrap();
        assert_eq!(first.views, 1);
        assert_eq!(second.views, 2);
    }

    #[tokio::test]
    async fn missing_is_active_column_still_creates_and_deletes() {
        let (repo, svc) = svc();
        repo.drop_column("is_active").await;
        let e = svc.create(None, None, input("Sarau", 3)).await.unwrap();
        assert!(e.is_active);
        svc.soft_delete(e.id).await.unwrap();
        assert!(svc.get_by_slug_and_count_view(&e.slug).await.is_err());
    }
}
