use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{subscriber, PlanType, ProfileType, SubscriberStatus};

use super::repository::{DirectoryFilter, SubscriberRepository};
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::plans;
use crate::schema::{insert_tolerant, update_tolerant};
use crate::slug::insert_with_unique_slug;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_type: ProfileType,
    #[serde(default)]
    pub plan_type: PlanType,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_type: Option<ProfileType>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

pub struct SubscriberService<R: SubscriberRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: SubscriberRepository + ?Sized> SubscriberService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn get(&self, id: Uuid) -> Result<subscriber::Model, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("subscriber"))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<subscriber::Model>, ServiceError> {
        self.repo.find_by_user(user_id).await
    }

    /// Create a subscriber; a user owns at most one.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(
        &self,
        tenant_id: Option<Uuid>,
        user_id: Option<Uuid>,
        input: SubscriberInput,
    ) -> Result<subscriber::Model, ServiceError> {
        if let Some(uid) = user_id {
            if self.repo.find_by_user(uid).await?.is_some() {
                return Err(ServiceError::Conflict("user already has a subscriber profile".into()));
            }
        }
        let now = Utc::now().into();
        let template = subscriber::Model {
            id: Uuid::nil(),
            tenant_id,
            user_id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.clone(),
            profile_type: input.profile_type.as_str().to_string(),
            plan_type: input.plan_type.as_str().to_string(),
            status: SubscriberStatus::Active.as_str().to_string(),
            category_id: input.category_id,
            slug: String::new(),
            description: input.description.clone(),
            views: 0,
            created_at: now,
            updated_at: now,
        };
        subscriber::validate(&template)?;

        let created = insert_with_unique_slug(&*self.repo, "subscribers", &input.name, |slug| {
            let row = subscriber::Model { id: Uuid::new_v4(), slug, ..template.clone() };
            let repo = self.repo.clone();
            async move { insert_tolerant(&*repo, row).await }
        })
        .await?;
        info!(id = %created.id, slug = %created.slug, plan = %created.plan_type, "subscriber registered");
        Ok(created)
    }

    /// The user's subscriber, created on the free plan the first time.
    #[instrument(skip(self, name, email))]
    pub async fn ensure_for_user(
        &self,
        tenant_id: Option<Uuid>,
        user_id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<subscriber::Model, ServiceError> {
        if let Some(existing) = self.repo.find_by_user(user_id).await? {
            return Ok(existing);
        }
        let input = SubscriberInput {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            profile_type: ProfileType::Empresarial,
            plan_type: PlanType::Gratuito,
            category_id: None,
            description: None,
        };
        match self.register(tenant_id, Some(user_id), input).await {
            // lost a race with a concurrent first login
            Err(ServiceError::Conflict(_)) => self
                .repo
                .find_by_user(user_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("subscriber")),
            other => other,
        }
    }

    /// Profile edits; slug and plan are left alone.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<subscriber::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        if let Some(name) = update.name {
            next.name = name.trim().to_string();
        }
        if update.phone.is_some() {
            next.phone = update.phone;
        }
        if let Some(p) = update.profile_type {
            next.profile_type = p.as_str().to_string();
        }
        if update.category_id.is_some() {
            next.category_id = update.category_id;
        }
        if update.description.is_some() {
            next.description = update.description;
        }
        next.updated_at = Utc::now().into();
        subscriber::validate(&next)?;
        update_tolerant(&*self.repo, &current, next).await
    }

    pub async fn set_plan(&self, id: Uuid, plan: PlanType) -> Result<subscriber::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.plan_type = plan.as_str().to_string();
        next.updated_at = Utc::now().into();
        let stored = update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, from = %current.plan_type, to = %stored.plan_type, "subscriber plan changed");
        Ok(stored)
    }

    /// Public page of an active subscriber whose plan includes one; counts a view.
    #[instrument(skip(self))]
    pub async fn public_page(&self, slug: &str) -> Result<subscriber::Model, ServiceError> {
        let found = self
            .repo
            .find_by_slug(slug)
            .await?
            .filter(|s| s.is_active() && plans::features(s.plan()).public_page)
            .ok_or_else(|| ServiceError::not_found("subscriber"))?;
        self.repo.increment_views(found.id).await?;
        common::metrics::record_view("subscriber");
        Ok(self.repo.get(found.id).await?.unwrap_or(subscriber::Model { views: found.views + 1, ..found }))
    }

    pub async fn directory(&self, filter: DirectoryFilter, page: Pagination) -> Result<Vec<subscriber::Model>, ServiceError> {
        self.repo.list(filter, page).await
    }

    /// Soft delete.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<subscriber::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut next = current.clone();
        next.status = SubscriberStatus::Inactive.as_str().to_string();
        next.updated_at = Utc::now().into();
        let stored = update_tolerant(&*self.repo, &current, next).await?;
        info!(id = %id, "subscriber deactivated");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryTable;
    use crate::subscriber::MemorySubscriberRepository;

    fn svc() -> (Arc<MemorySubscriberRepository>, SubscriberService<MemorySubscriberRepository>) {
        let repo = Arc::new(MemoryTable::new("subscribers"));
        (repo.clone(), SubscriberService::new(repo))
    }

    fn input(name: &str, plan: PlanType) -> SubscriberInput {
        SubscriberInput {
            name: name.into(),
            email: "contato@example.com".into(),
            phone: Some("(11) 98765-4321".into()),
            profile_type: ProfileType::Empresarial,
            plan_type: plan,
            category_id: None,
            description: Some("Desde 1985".into()),
        }
    }

    #[tokio::test]
    async fn public_page_requires_plan_and_counts_views() {
        let (_, svc) = svc();
        let free = svc.register(None, None, input("Mercado Bom Preço", PlanType::Gratuito)).await.unwrap();
        let paid = svc.register(None, None, input("Ótica Visão", PlanType::Essencial)).await.unwrap();

        assert!(matches!(svc.public_page(&free.slug).await, Err(ServiceError::NotFound(_))));
        let seen = svc.public_page(&paid.slug).await.unwrap();
        assert_eq!(seen.slug, "otica-visao");
        assert_eq!(seen.views, 1);

        svc.deactivate(paid.id).await.unwrap();
        assert!(svc.public_page(&paid.slug).await.is_err());
    }

    #[tokio::test]
    async fn one_subscriber_per_user() {
        let (_, svc) = svc();
        let uid = Uuid::new_v4();
        let first = svc.ensure_for_user(None, uid, "Joana Lima", "joana@example.com").await.unwrap();
        let again = svc.ensure_for_user(None, uid, "Joana Lima", "joana@example.com").await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.plan(), PlanType::Gratuito);
        assert!(matches!(
            svc.register(None, Some(uid), input("Outra", PlanType::Premium)).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_tolerates_missing_description_column() {
        let (repo, svc) = svc();
        let s = svc.register(None, None, input("Clínica Sorriso", PlanType::Premium)).await.unwrap();
        repo.drop_column("description").await;
        let u = svc
            .update_profile(s.id, ProfileUpdate { name: Some("Clínica Sorriso Feliz".into()), description: Some("novo".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(u.name, "Clínica Sorriso Feliz");
        assert_eq!(u.description.as_deref(), Some("Desde 1985"));
        assert_eq!(u.slug, s.slug);
    }

    #[tokio::test]
    async fn directory_lists_active_by_profile() {
        let (_, svc) = svc();
        svc.register(None, None, input("Padaria Pão Quente", PlanType::Gratuito)).await.unwrap();
        let mut pro = input("Dra. Ana Souza", PlanType::Essencial);
        pro.profile_type = ProfileType::Profissional;
        svc.register(None, None, pro).await.unwrap();
        let gone = svc.register(None, None, input("Antiga Loja", PlanType::Gratuito)).await.unwrap();
        svc.deactivate(gone.id).await.unwrap();

        let companies = svc
            .directory(DirectoryFilter { profile_type: Some(ProfileType::Empresarial), ..Default::default() }, Pagination::default())
            .await
            .unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Padaria Pão Quente");
    }

    #[tokio::test]
    async fn invalid_phone_is_rejected() {
        let (_, svc) = svc();
        let mut bad = input("Loja", PlanType::Gratuito);
        bad.phone = Some("123".into());
        assert!(matches!(svc.register(None, None, bad).await, Err(ServiceError::Validation(_))));
    }
}
