use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::news;

use super::repository::NewsRepository;
use crate::content::ContentFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::schema::{insert_tolerant, update_tolerant};
use crate::slug::insert_with_unique_slug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsInput {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub related_links: Vec<RelatedLink>,
    /// Publish right away.
    #[serde(default)]
    pub publish: bool,
}

impl NewsInput {
    fn apply(&self, row: &mut news::Model) -> Result<(), ServiceError> {
        row.title = self.title.trim().to_string();
        row.excerpt = self.excerpt.clone();
        row.content = self.content.clone();
        row.cover_image = self.cover_image.clone();
        row.category_id = self.category_id;
        row.gallery = serde_json::to_value(&self.gallery).map_err(|e| ServiceError::Validation(e.to_string()))?;
        row.related_links =
            serde_json::to_value(&self.related_links).map_err(|e| ServiceError::Validation(e.to_string()))?;
        Ok(())
    }
}

pub struct NewsService<R: NewsRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: NewsRepository + ?Sized> NewsService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn get(&self, id: Uuid) -> Result<news::Model, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("news"))
    }

    pub async fn list(&self, filter: ContentFilter, page: Pagination) -> Result<Vec<news::Model>, ServiceError> {
        self.repo.list(filter, page).await
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(
        &self,
        tenant_id: Option<Uuid>,
        author_id: Option<Uuid>,
        input: NewsInput,
    ) -> Result<news::Model, ServiceError> {
        let now = Utc::now().into();
        let mut template = news::Model {
            id: Uuid::nil(),
            tenant_id,
            author_id,
            category_id: None,
            title: String::new(),
            slug: String::new(),
            excerpt: None,
            content: String::new(),
            cover_image: None,
            gallery: serde_json::json!([]),
            related_links: serde_json::json!([]),
            is_published: input.publish,
            published_at: input.publish.then_some(now),
            views: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        input.apply(&mut template)?;
        news::validate(&template)?;

        let created = insert_with_unique_slug(&*self.repo, "news", &input.title, |slug| {
            let row = news::Model { id: Uuid::new_v4(), slug, ..template.clone() };
            let repo = self.repo.clone();
            async move { insert_tolerant(&*repo, row).await }
        })
        .await?;
        info!(id = %created.id, slug = %created.slug, published = created.is_published, "news created");
        Ok(created)
    }

    /// The slug is kept so published links stay valid.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: NewsInput) -> Result<news::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        input.apply(&mut next)?;
        if input.publish && !next.is_published {
            next.is_published = true;
            next.published_at = next.published_at.or_else(|| Some(Utc::now().into()));
        }
        next.updated_at = Utc::now().into();
        news::validate(&next)?;
        update_tolerant(&*self.repo, &current, next).await
    }

    /// Publish or unpublish. `published_at` is set the first time only.
    #[instrument(skip(self))]
    pub async fn set_published(&self, id: Uuid, published: bool) -> Result<news::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.is_published = published;
        if published && next.published_at.is_none() {
            next.published_at = Some(Utc::now().into());
        }
        next.updated_at = Utc::now().into();
        let stored = update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, published, "news publication changed");
        Ok(stored)
    }

    /// Public detail page: returns the article with the view already counted.
    #[instrument(skip(self))]
    pub async fn get_by_slug_and_count_view(&self, slug: &str) -> Result<news::Model, ServiceError> {
        let found = self
            .repo
            .find_by_slug(slug)
            .await?
            .filter(|n| n.is_published && n.is_active)
            .ok_or_else(|| ServiceError::not_found("news"))?;
        self.repo.increment_views(found.id).await?;
        common::metrics::record_view("news");
        // re-read so concurrent increments are reflected
        Ok(self.repo.get(found.id).await?.unwrap_or(news::Model { views: found.views + 1, ..found }))
    }

    /// Soft delete; also unpublishes so the row leaves public listings even
    /// where the table has no `is_active` column.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.is_active = false;
        next.is_published = false;
        next.updated_at = Utc::now().into();
        update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, "news deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::MemoryNewsRepository;
    use crate::storage::memory::MemoryTable;

    fn svc() -> (Arc<MemoryNewsRepository>, NewsService<MemoryNewsRepository>) {
        let repo = Arc::new(MemoryTable::new("news"));
        (repo.clone(), NewsService::new(repo))
    }

    fn input(title: &str, publish: bool) -> NewsInput {
        NewsInput { title: title.into(), content: "Texto da matéria".into(), publish, ..Default::default() }
    }

    #[tokio::test]
    async fn duplicate_titles_get_distinct_slugs() {
        let (_, svc) = svc();
        let a = svc.create(None, None, input("Obras na Avenida Brasil", true)).await.unwrap();
        let b = svc.create(None, None, input("Obras na Avenida Brasil", true)).await.unwrap();
        assert_eq!(a.slug, "obras-na-avenida-brasil");
        assert_ne!(a.slug, b.slug);
    }

    #[tokio::test]
    async fn views_never_decrease() {
        let (_, svc) = svc();
        let n = svc.create(None, None, input("Vacinação", true)).await.unwrap();
        let mut last = n.views;
        for _ in 0..5 {
            let seen = svc.get_by_slug_and_count_view(&n.slug).await.unwrap();
            assert!(seen.views > last);
            last = seen.views;
        }
        assert_eq!(last, 5);
    }

    #[tokio::test]
    async fn concurrent_views_are_all_counted() {
        let (repo, svc) = svc();
        let n = svc.create(None, None, input("Show na praça", true)).await.unwrap();
        let svc = Arc::new(svc);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let svc = svc.clone();
            let slug = n.slug.clone();
            handles.push(tokio::spawn(async move { svc.get_by_slug_and_count_view(&slug).await.map(|m| m.views) }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(repo.by_id(n.id).await.unwrap().views, 20);
    }

    #[tokio::test]
    async fn drafts_are_hidden_until_published() {
        let (_, svc) = svc();
        let draft = svc.create(None, None, input("Rascunho", false)).await.unwrap();
        assert!(draft.published_at.is_none());
        assert!(matches!(svc.get_by_slug_and_count_view(&draft.slug).await, Err(ServiceError::NotFound(_))));
        assert!(svc.list(ContentFilter::public(), Pagination::default()).await.unwrap().is_empty());

        let published = svc.set_published(draft.id, true).await.unwrap();
        let first = published.published_at.unwrap();
        svc.set_published(draft.id, false).await.unwrap();
        let again = svc.set_published(draft.id, true).await.unwrap();
        assert_eq!(again.published_at, Some(first));
        assert_eq!(svc.list(ContentFilter::public(), Pagination::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_survives_missing_gallery_column() {
        let (repo, svc) = svc();
        repo.drop_column("gallery").await;
        let mut i = input("Galeria", true);
        i.gallery = vec!["https://cdn.example.com/a.jpg".into()];
        i.related_links = vec![RelatedLink { title: "Prefeitura".into(), url: "https://example.com".into() }];
        let n = svc.create(None, None, i).await.unwrap();
        assert_eq!(n.gallery, serde_json::json!([]));
        assert_eq!(n.related_links[0]["title"], "Prefeitura");
    }

    #[tokio::test]
    async fn update_keeps_slug_and_soft_delete_hides() {
        let (_, svc) = svc();
        let n = svc.create(None, None, input("Trânsito", true)).await.unwrap();
        let u = svc.update(n.id, input("Trânsito no feriado", false)).await.unwrap();
        assert_eq!(u.slug, "transito");
        assert_eq!(u.title, "Trânsito no feriado");

        svc.soft_delete(n.id).await.unwrap();
        assert!(svc.get_by_slug_and_count_view("transito").await.is_err());
        let all = svc.list(ContentFilter::admin(None), Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[tokio::test]
    async fn tenant_filter_scopes_listing() {
        let (_, svc) = svc();
        let city_a = Uuid::new_v4();
        svc.create(Some(city_a), None, input("Notícia A", true)).await.unwrap();
        svc.create(Some(Uuid::new_v4()), None, input("Notícia B", true)).await.unwrap();
        let filter = ContentFilter { tenant_id: Some(city_a), ..ContentFilter::public() };
        let rows = svc.list(filter, Pagination::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Notícia A");
    }
}
