use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::product;

use super::repository::ProductRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::plans::{self, ProductAllowance};
use crate::slug::insert_with_unique_slug;
use crate::subscriber::SubscriberRepository;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub promo_price_cents: Option<i64>,
    #[serde(default)]
    pub is_promotion: bool,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: Option<bool>,
}

impl ProductInput {
    fn apply(&self, row: &mut product::Model) -> Result<(), ServiceError> {
        row.name = self.name.trim().to_string();
        row.description = self.description.clone();
        row.price_cents = self.price_cents;
        row.promo_price_cents = self.promo_price_cents;
        row.is_promotion = self.is_promotion;
        row.stock = self.stock;
        row.tags = serde_json::to_value(&self.tags).map_err(|e| ServiceError::Validation(e.to_string()))?;
        if let Some(active) = self.is_active {
            row.is_active = active;
        }
        Ok(())
    }
}

pub struct ProductService<P: ProductRepository + ?Sized, S: SubscriberRepository + ?Sized> {
    products: Arc<P>,
    subscribers: Arc<S>,
}

impl<P: ProductRepository + ?Sized, S: SubscriberRepository + ?Sized> ProductService<P, S> {
    pub fn new(products: Arc<P>, subscribers: Arc<S>) -> Self { Self { products, subscribers } }

    pub async fn allowance(&self, subscriber_id: Uuid) -> Result<ProductAllowance, ServiceError> {
        let owner = self
            .subscribers
            .get(subscriber_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("subscriber"))?;
        let current = self.products.count_active(subscriber_id).await?;
        Ok(plans::can_add_product(owner.plan(), current))
    }

    async fn ensure_room(&self, subscriber_id: Uuid) -> Result<(), ServiceError> {
        let allowance = self.allowance(subscriber_id).await?;
        if !allowance.can_add {
            warn!(%subscriber_id, limit = allowance.limit, "product limit reached");
            return Err(ServiceError::Forbidden(format!(
                "plan allows {} active products; upgrade to add more",
                allowance.limit
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, subscriber_id: Uuid, input: ProductInput) -> Result<product::Model, ServiceError> {
        if input.is_active.unwrap_or(true) {
            self.ensure_room(subscriber_id).await?;
        }
        let now = Utc::now().into();
        let mut template = product::Model {
            id: Uuid::nil(),
            subscriber_id,
            name: String::new(),
            slug: String::new(),
            description: None,
            price_cents: 0,
            promo_price_cents: None,
            is_promotion: false,
            stock: 0,
            tags: serde_json::json!([]),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        input.apply(&mut template)?;
        product::validate(&template)?;

        let created = insert_with_unique_slug(&*self.products, "products", &input.name, |slug| {
            let row = product::Model { id: Uuid::new_v4(), slug, ..template.clone() };
            let repo = self.products.clone();
            async move {
                repo.insert_product(&row).await?;
                Ok(row)
            }
        })
        .await?;
        info!(id = %created.id, slug = %created.slug, %subscriber_id, "product created");
        Ok(created)
    }

    async fn owned(&self, subscriber_id: Uuid, id: Uuid) -> Result<product::Model, ServiceError> {
        self.products
            .get(id)
            .await?
            .filter(|p| p.subscriber_id == subscriber_id)
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, subscriber_id: Uuid, id: Uuid, input: ProductInput) -> Result<product::Model, ServiceError> {
        let current = self.owned(subscriber_id, id).await?;
        let mut next = current.clone();
        input.apply(&mut next)?;
        if next.is_active && !current.is_active {
            self.ensure_room(subscriber_id).await?;
        }
        next.updated_at = Utc::now().into();
        product::validate(&next)?;
        self.products.save_product(&next).await?;
        Ok(next)
    }

    /// Soft delete; frees a slot under the plan cap.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, subscriber_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let mut row = self.owned(subscriber_id, id).await?;
        row.is_active = false;
        row.updated_at = Utc::now().into();
        self.products.save_product(&row).await?;
        info!(%id, "product deactivated");
        Ok(())
    }

    pub async fn list_mine(&self, subscriber_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        self.products.list_for_subscriber(subscriber_id, true).await
    }

    /// Storefront listing of an active subscriber.
    pub async fn storefront(&self, subscriber_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        let owner = self.subscribers.get(subscriber_id).await?.filter(|s| s.is_active());
        if owner.is_none() {
            return Err(ServiceError::not_found("subscriber"));
        }
        self.products.list_for_subscriber(subscriber_id, false).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        self.products
            .find_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    pub async fn promotions(&self, page: Pagination) -> Result<Vec<product::Model>, ServiceError> {
        self.products.list_promotions(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryTable;
    use crate::subscriber::{MemorySubscriberRepository, SubscriberInput, SubscriberService};
    use crate::product::MemoryProductRepository;
    use models::{PlanType, ProfileType};

    async fn setup(plan: PlanType) -> (Uuid, ProductService<MemoryProductRepository, MemorySubscriberRepository>) {
        let subs: Arc<MemorySubscriberRepository> = Arc::new(MemoryTable::new("subscribers"));
        let sub = SubscriberService::new(subs.clone())
            .register(
                None,
                None,
                SubscriberInput {
                    name: "Empório da Serra".into(),
                    email: "emporio@example.com".into(),
                    phone: None,
                    profile_type: ProfileType::Empresarial,
                    plan_type: plan,
                    category_id: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let products = Arc::new(MemoryTable::new("products"));
        (sub.id, ProductService::new(products, subs))
    }

    fn item(name: &str) -> ProductInput {
        ProductInput { name: name.into(), price_cents: 1500, stock: 10, ..Default::default() }
    }

    #[tokio::test]
    async fn free_plan_stops_at_three_products() {
        let (sid, svc) = setup(PlanType::Gratuito).await;
        for i in 0..3 {
            svc.create(sid, item(&format!("Queijo {i}"))).await.unwrap();
        }
        let allowance = svc.allowance(sid).await.unwrap();
        assert!(!allowance.can_add);
        assert_eq!(allowance.limit, 3);
        assert!(matches!(svc.create(sid, item("Queijo extra")).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn deactivating_frees_a_slot_and_reactivating_is_capped() {
        let (sid, svc) = setup(PlanType::Gratuito).await;
        let mut made = Vec::new();
        for i in 0..3 {
            made.push(svc.create(sid, item(&format!("Doce {i}"))).await.unwrap());
        }
        svc.deactivate(sid, made[0].id).await.unwrap();
        assert!(svc.allowance(sid).await.unwrap().can_add);
        svc.create(sid, item("Doce novo")).await.unwrap();

        let reactivate = ProductInput { is_active: Some(true), ..item("Doce 0") };
        assert!(matches!(svc.update(sid, made[0].id, reactivate).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn products_of_other_subscribers_are_not_editable() {
        let (sid, svc) = setup(PlanType::Premium).await;
        let p = svc.create(sid, item("Mel")).await.unwrap();
        assert!(matches!(svc.update(Uuid::new_v4(), p.id, item("Mel puro")).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn promotions_need_a_promo_price() {
        let (sid, svc) = setup(PlanType::Premium).await;
        let bad = ProductInput { is_promotion: true, ..item("Café") };
        assert!(matches!(svc.create(sid, bad).await, Err(ServiceError::Validation(_))));

        let good = ProductInput { is_promotion: true, promo_price_cents: Some(990), ..item("Café") };
        let p = svc.create(sid, good).await.unwrap();
        assert_eq!(p.effective_price_cents(), 990);
        assert_eq!(svc.promotions(Pagination::default()).await.unwrap().len(), 1);
    }
}
