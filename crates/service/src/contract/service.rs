use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{contract, ContractStatus, PaymentMethod, PlanType};

use super::repository::ContractRepository;
use crate::errors::ServiceError;
use crate::plans;
use crate::product::ProductRepository;
use crate::subscriber::{SubscriberRepository, SubscriberService};

#[derive(Debug, Clone, Deserialize)]
pub struct PlanChangeRequest {
    pub plan_type: PlanType,
    #[serde(default = "default_payment")]
    pub payment_method: PaymentMethod,
}

fn default_payment() -> PaymentMethod {
    PaymentMethod::Pix
}

pub struct ContractService<C, P, S>
where
    C: ContractRepository + ?Sized,
    P: ProductRepository + ?Sized,
    S: SubscriberRepository + ?Sized,
{
    contracts: Arc<C>,
    products: Arc<P>,
    subscribers: SubscriberService<S>,
}

impl<C, P, S> ContractService<C, P, S>
where
    C: ContractRepository + ?Sized,
    P: ProductRepository + ?Sized,
    S: SubscriberRepository + ?Sized,
{
    pub fn new(contracts: Arc<C>, products: Arc<P>, subscribers: Arc<S>) -> Self {
        Self { contracts, products, subscribers: SubscriberService::new(subscribers) }
    }

    pub async fn list_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<contract::Model>, ServiceError> {
        self.contracts.list_for_subscriber(subscriber_id).await
    }

    /// Record a plan change. Paid upgrades stay `pending` until activated;
    /// downgrades and moves to the free plan take effect immediately.
    #[instrument(skip(self, req), fields(to = %req.plan_type))]
    pub async fn request_change(&self, subscriber_id: Uuid, req: PlanChangeRequest) -> Result<contract::Model, ServiceError> {
        let sub = self.subscribers.get(subscriber_id).await?;
        let from = sub.plan();
        let to = req.plan_type;
        if from == to {
            return Err(ServiceError::Validation(format!("subscriber is already on plan {to}")));
        }
        if plans::is_downgrade(from, to) {
            let active = self.products.count_active(subscriber_id).await?;
            let limit = plans::features(to).max_products;
            if active > u64::from(limit) {
                return Err(ServiceError::Validation(format!(
                    "deactivate {} products before moving to {to} (limit {limit})",
                    active - u64::from(limit)
                )));
            }
        }

        let price = plans::features(to).monthly_price_cents;
        let immediate = plans::is_downgrade(from, to) || price == 0;
        let now = Utc::now().into();
        let row = contract::Model {
            id: Uuid::new_v4(),
            subscriber_id,
            from_plan: from.as_str().to_string(),
            to_plan: to.as_str().to_string(),
            payment_method: req.payment_method.as_str().to_string(),
            amount_cents: if immediate { 0 } else { price },
            status: (if immediate { ContractStatus::Active } else { ContractStatus::Pending }).as_str().to_string(),
            created_at: now,
            activated_at: immediate.then_some(now),
        };
        self.contracts.insert_contract(&row).await?;
        if immediate {
            self.subscribers.set_plan(subscriber_id, to).await?;
        }
        info!(contract_id = %row.id, from = %from, to = %to, status = %row.status, "plan change requested");
        Ok(row)
    }

    /// Confirm a pending contract (payment simulated) and move the subscriber.
    #[instrument(skip(self))]
    pub async fn activate(&self, id: Uuid) -> Result<contract::Model, ServiceError> {
        let mut row = self.get_pending(id).await?;
        let to: PlanType = row
            .to_plan
            .parse()
            .map_err(|e: String| ServiceError::Db(format!("contract {id}: {e}")))?;
        row.status = ContractStatus::Active.as_str().to_string();
        row.activated_at = Some(Utc::now().into());
        self.contracts.save_contract(&row).await?;
        self.subscribers.set_plan(row.subscriber_id, to).await?;
        info!(contract_id = %id, subscriber_id = %row.subscriber_id, plan = %to, "contract activated");
        Ok(row)
    }

    /// Cancel a pending contract; only its owner may do so.
    pub async fn cancel(&self, subscriber_id: Uuid, id: Uuid) -> Result<contract::Model, ServiceError> {
        let mut row = self.get_pending(id).await?;
        if row.subscriber_id != subscriber_id {
            return Err(ServiceError::not_found("contract"));
        }
        row.status = ContractStatus::Canceled.as_str().to_string();
        self.contracts.save_contract(&row).await?;
        info!(contract_id = %id, "contract canceled");
        Ok(row)
    }

    async fn get_pending(&self, id: Uuid) -> Result<contract::Model, ServiceError> {
        let row = self.contracts.get(id).await?.ok_or_else(|| ServiceError::not_found("contract"))?;
        if row.contract_status() != Some(ContractStatus::Pending) {
            return Err(ServiceError::Conflict(format!("contract is {}", row.status)));
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MemoryContractRepository;
    use crate::product::{MemoryProductRepository, ProductInput, ProductService};
    use crate::storage::memory::MemoryTable;
    use crate::subscriber::{MemorySubscriberRepository, SubscriberInput};
    use models::ProfileType;

    type Svc = ContractService<MemoryContractRepository, MemoryProductRepository, MemorySubscriberRepository>;

    async fn setup(plan: PlanType) -> (Uuid, Svc, ProductService<MemoryProductRepository, MemorySubscriberRepository>, Arc<MemorySubscriberRepository>) {
        let subs: Arc<MemorySubscriberRepository> = Arc::new(MemoryTable::new("subscribers"));
        let products: Arc<MemoryProductRepository> = Arc::new(MemoryTable::new("products"));
        let sub = SubscriberService::new(subs.clone())
            .register(
                None,
                None,
                SubscriberInput {
                    name: "Oficina do João".into(),
                    email: "joao@example.com".into(),
                    phone: None,
                    profile_type: ProfileType::Profissional,
                    plan_type: plan,
                    category_id: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let svc = ContractService::new(Arc::new(MemoryTable::new("contracts")), products.clone(), subs.clone());
        (sub.id, svc, ProductService::new(products, subs.clone()), subs)
    }

    fn to(plan: PlanType) -> PlanChangeRequest {
        PlanChangeRequest { plan_type: plan, payment_method: PaymentMethod::Boleto }
    }

    #[tokio::test]
    async fn same_plan_is_rejected() {
        let (id, svc, _, _) = setup(PlanType::Essencial).await;
        assert!(matches!(svc.request_change(id, to(PlanType::Essencial)).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn paid_upgrade_waits_for_activation() {
        let (id, svc, _, subs) = setup(PlanType::Gratuito).await;
        let c = svc.request_change(id, to(PlanType::Premium)).await.unwrap();
        assert_eq!(c.status, "pending");
        assert_eq!(c.amount_cents, 9990);
        assert_eq!(subs.by_id(id).await.unwrap().plan(), PlanType::Gratuito);

        let active = svc.activate(c.id).await.unwrap();
        assert!(active.activated_at.is_some());
        assert_eq!(subs.by_id(id).await.unwrap().plan(), PlanType::Premium);
        assert!(matches!(svc.activate(c.id).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn downgrade_blocked_while_over_target_limit() {
        let (id, svc, catalog, subs) = setup(PlanType::Essencial).await;
        for i in 0..4 {
            catalog
                .create(id, ProductInput { name: format!("Serviço {i}"), price_cents: 1000, stock: 1, ..Default::default() })
                .await
                .unwrap();
        }
        assert!(matches!(svc.request_change(id, to(PlanType::Gratuito)).await, Err(ServiceError::Validation(_))));

        let first = catalog.list_mine(id).await.unwrap()[0].id;
        catalog.deactivate(id, first).await.unwrap();
        let c = svc.request_change(id, to(PlanType::Gratuito)).await.unwrap();
        assert_eq!(c.status, "active");
        assert_eq!(subs.by_id(id).await.unwrap().plan(), PlanType::Gratuito);
    }

    #[tokio::test]
    async fn owner_can_cancel_pending() {
        let (id, svc, _, _) = setup(PlanType::Essencial).await;
        let c = svc.request_change(id, to(PlanType::PremiumVip)).await.unwrap();
        assert!(matches!(svc.cancel(Uuid::new_v4(), c.id).await, Err(ServiceError::NotFound(_))));
        assert_eq!(svc.cancel(id, c.id).await.unwrap().status, "canceled");
        assert_eq!(svc.list_for_subscriber(id).await.unwrap().len(), 1);
    }
}
