use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{order, order_item, OrderStatus, PaymentMethod};

use super::repository::OrderRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::plans;
use crate::product::ProductRepository;
use crate::subscriber::SubscriberRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    pub seller_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

pub struct OrderService<O, P, S>
where
    O: OrderRepository + ?Sized,
    P: ProductRepository + ?Sized,
    S: SubscriberRepository + ?Sized,
{
    orders: Arc<O>,
    products: Arc<P>,
    subscribers: Arc<S>,
}

impl<O, P, S> OrderService<O, P, S>
where
    O: OrderRepository + ?Sized,
    P: ProductRepository + ?Sized,
    S: SubscriberRepository + ?Sized,
{
    pub fn new(orders: Arc<O>, products: Arc<P>, subscribers: Arc<S>) -> Self {
        Self { orders, products, subscribers }
    }

    /// Checkout against one seller. Prices are read from the catalog, never
    /// from the request; stock is reserved atomically with the order insert.
    #[instrument(skip(self, input), fields(seller_id = %input.seller_id, lines = input.items.len()))]
    pub async fn place_order(&self, input: OrderInput) -> Result<OrderReceipt, ServiceError> {
        let seller = self
            .subscribers
            .get(input.seller_id)
            .await?
            .filter(|s| s.is_active())
            .ok_or_else(|| ServiceError::not_found("seller"))?;
        if !plans::features(seller.plan()).store {
            return Err(ServiceError::Forbidden("seller plan does not include a store".into()));
        }
        models::validation::validate_name(&input.buyer_name)?;
        models::validation::validate_email(&input.buyer_email)?;
        if let Some(phone) = &input.buyer_phone {
            models::validation::validate_phone(phone)?;
        }
        if input.items.is_empty() {
            return Err(ServiceError::Validation("order has no items".into()));
        }

        // merge repeated lines for the same product
        let mut wanted: BTreeMap<Uuid, i32> = BTreeMap::new();
        for line in &input.items {
            if line.quantity < 1 {
                return Err(ServiceError::Validation("quantity must be >= 1".into()));
            }
            let merged = wanted.entry(line.product_id).or_default();
            *merged = merged
                .checked_add(line.quantity)
                .ok_or_else(|| ServiceError::Validation("quantity is too large".into()))?;
        }

        let now = Utc::now().into();
        let order_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(wanted.len());
        let mut total: i64 = 0;
        for (product_id, quantity) in wanted {
            let p = self
                .products
                .get(product_id)
                .await?
                .filter(|p| p.is_active && p.subscriber_id == seller.id)
                .ok_or_else(|| ServiceError::Validation(format!("product {product_id} is not sold by this store")))?;
            if p.stock < quantity {
                return Err(ServiceError::Conflict(format!("insufficient stock for {}", p.name)));
            }
            let unit = p.effective_price_cents();
            let subtotal = unit
                .checked_mul(i64::from(quantity))
                .ok_or_else(|| ServiceError::Validation("order total is too large".into()))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| ServiceError::Validation("order total is too large".into()))?;
            items.push(order_item::Model {
                id: Uuid::new_v4(),
                order_id,
                product_id,
                product_name: p.name.clone(),
                unit_price_cents: unit,
                quantity,
                subtotal_cents: subtotal,
            });
        }

        let row = order::Model {
            id: order_id,
            subscriber_id: seller.id,
            buyer_name: input.buyer_name.trim().to_string(),
            buyer_email: input.buyer_email.trim().to_lowercase(),
            buyer_phone: input.buyer_phone.clone(),
            shipping_address: input.shipping_address.clone(),
            payment_method: input.payment_method.as_str().to_string(),
            status: OrderStatus::Pending.as_str().to_string(),
            total_cents: total,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.orders.place(&row, &items).await {
            warn!(order_id = %order_id, error = %e, "checkout rejected");
            return Err(e);
        }
        info!(order_id = %order_id, total_cents = total, payment = %row.payment_method, "order placed");
        Ok(OrderReceipt { order: row, items })
    }

    pub async fn get_for_seller(&self, seller_id: Uuid, id: Uuid) -> Result<OrderReceipt, ServiceError> {
        let order = self
            .orders
            .get(id)
            .await?
            .filter(|o| o.subscriber_id == seller_id)
            .ok_or_else(|| ServiceError::not_found("order"))?;
        let items = self.orders.items(id).await?;
        Ok(OrderReceipt { order, items })
    }

    pub async fn list_for_seller(&self, seller_id: Uuid, page: Pagination) -> Result<Vec<order::Model>, ServiceError> {
        self.orders.list_for_seller(seller_id, page).await
    }

    /// Move an order forward; canceling returns the items to stock.
    #[instrument(skip(self))]
    pub async fn set_status(&self, seller_id: Uuid, id: Uuid, next: OrderStatus) -> Result<OrderReceipt, ServiceError> {
        let receipt = self.get_for_seller(seller_id, id).await?;
        let current = receipt
            .order
            .order_status()
            .ok_or_else(|| ServiceError::Db(format!("order {id} has unknown status {}", receipt.order.status)))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::Validation(format!("cannot move order from {current} to {next}")));
        }
        self.orders.set_status(id, current, next, next == OrderStatus::Canceled).await?;
        info!(order_id = %id, from = %current, to = %next, "order status changed");
        self.get_for_seller(seller_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::MemoryOrderRepository;
    use crate::product::{MemoryProductRepository, ProductInput, ProductService};
    use crate::storage::memory::MemoryTable;
    use crate::subscriber::{MemorySubscriberRepository, SubscriberInput, SubscriberService};
    use models::{PlanType, ProfileType};

    struct Fixture {
        seller: Uuid,
        products: Arc<MemoryProductRepository>,
        orders: Arc<MemoryOrderRepository>,
        catalog: ProductService<MemoryProductRepository, MemorySubscriberRepository>,
        svc: OrderService<MemoryOrderRepository, MemoryProductRepository, MemorySubscriberRepository>,
    }

    async fn fixture(plan: PlanType) -> Fixture {
        let subs: Arc<MemorySubscriberRepository> = Arc::new(MemoryTable::new("subscribers"));
        let products: Arc<MemoryProductRepository> = Arc::new(MemoryTable::new("products"));
        let seller = SubscriberService::new(subs.clone())
            .register(
                None,
                None,
                SubscriberInput {
                    name: "Armazém Central".into(),
                    email: "armazem@example.com".into(),
                    phone: None,
                    profile_type: ProfileType::Empresarial,
                    plan_type: plan,
                    category_id: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let orders = Arc::new(MemoryOrderRepository::new(products.clone()));
        Fixture {
            seller: seller.id,
            products: products.clone(),
            orders: orders.clone(),
            catalog: ProductService::new(products.clone(), subs.clone()),
            svc: OrderService::new(orders, products, subs),
        }
    }

    fn order(seller: Uuid, items: Vec<OrderLine>) -> OrderInput {
        OrderInput {
            seller_id: seller,
            buyer_name: "Marina".into(),
            buyer_email: "marina@example.com".into(),
            buyer_phone: None,
            shipping_address: Some("Rua das Flores, 10".into()),
            payment_method: PaymentMethod::Pix,
            items,
        }
    }

    #[tokio::test]
    async fn checkout_uses_promo_price_and_decrements_stock() {
        let f = fixture(PlanType::Premium).await;
        let p = f
            .catalog
            .create(
                f.seller,
                ProductInput {
                    name: "Azeite".into(),
                    price_cents: 4000,
                    promo_price_cents: Some(3500),
                    is_promotion: true,
                    stock: 5,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let lines = vec![OrderLine { product_id: p.id, quantity: 1 }, OrderLine { product_id: p.id, quantity: 1 }];
        let receipt = f.svc.place_order(order(f.seller, lines)).await.unwrap();
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].quantity, 2);
        assert_eq!(receipt.order.total_cents, 7000);
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn plan_without_store_cannot_sell() {
        let f = fixture(PlanType::Essencial).await;
        let p = f.catalog.create(f.seller, ProductInput { name: "Vela".into(), price_cents: 800, stock: 3, ..Default::default() }).await.unwrap();
        let res = f.svc.place_order(order(f.seller, vec![OrderLine { product_id: p.id, quantity: 1 }])).await;
        assert!(matches!(res, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_everything_untouched() {
        let f = fixture(PlanType::Premium).await;
        let a = f.catalog.create(f.seller, ProductInput { name: "Pão".into(), price_cents: 100, stock: 10, ..Default::default() }).await.unwrap();
        let b = f.catalog.create(f.seller, ProductInput { name: "Leite".into(), price_cents: 500, stock: 1, ..Default::default() }).await.unwrap();

        let res = f
            .svc
            .place_order(order(f.seller, vec![OrderLine { product_id: a.id, quantity: 2 }, OrderLine { product_id: b.id, quantity: 2 }]))
            .await;
        assert!(matches!(res, Err(ServiceError::Conflict(_))));
        assert_eq!(f.products.by_id(a.id).await.unwrap().stock, 10);
        assert!(f.svc.list_for_seller(f.seller, Pagination::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_flow_and_cancel_restocks() {
        let f = fixture(PlanType::PremiumVip).await;
        let p = f.catalog.create(f.seller, ProductInput { name: "Vinho".into(), price_cents: 9000, stock: 4, ..Default::default() }).await.unwrap();
        let r = f.svc.place_order(order(f.seller, vec![OrderLine { product_id: p.id, quantity: 3 }])).await.unwrap();
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 1);

        let paid = f.svc.set_status(f.seller, r.order.id, OrderStatus::Paid).await.unwrap();
        assert_eq!(paid.order.status, "paid");
        assert!(matches!(
            f.svc.set_status(f.seller, r.order.id, OrderStatus::Delivered).await,
            Err(ServiceError::Validation(_))
        ));
        f.svc.set_status(f.seller, r.order.id, OrderStatus::Canceled).await.unwrap();
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 4);
        assert!(matches!(
            f.svc.set_status(Uuid::new_v4(), r.order.id, OrderStatus::Paid).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn overflowing_quantities_are_rejected() {
        let f = fixture(PlanType::Premium).await;
        let p = f.catalog.create(f.seller, ProductInput { name: "Sal".into(), price_cents: 100, stock: 5, ..Default::default() }).await.unwrap();
        let lines = vec![
            OrderLine { product_id: p.id, quantity: i32::MAX },
            OrderLine { product_id: p.id, quantity: i32::MAX },
        ];
        let res = f.svc.place_order(order(f.seller, lines)).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 5);
        assert!(f.svc.list_for_seller(f.seller, Pagination::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_cancel_does_not_restock_twice() {
        let f = fixture(PlanType::Premium).await;
        let p = f.catalog.create(f.seller, ProductInput { name: "Queijo".into(), price_cents: 2000, stock: 5, ..Default::default() }).await.unwrap();
        let r = f.svc.place_order(order(f.seller, vec![OrderLine { product_id: p.id, quantity: 2 }])).await.unwrap();

        // both requests saw the order as pending
        f.orders.set_status(r.order.id, OrderStatus::Pending, OrderStatus::Canceled, true).await.unwrap();
        let second = f.orders.set_status(r.order.id, OrderStatus::Pending, OrderStatus::Canceled, true).await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn concurrent_cancels_restock_once() {
        let f = fixture(PlanType::Premium).await;
        let p = f.catalog.create(f.seller, ProductInput { name: "Doce".into(), price_cents: 700, stock: 6, ..Default::default() }).await.unwrap();
        let r = f.svc.place_order(order(f.seller, vec![OrderLine { product_id: p.id, quantity: 4 }])).await.unwrap();

        let (a, b) = tokio::join!(
            f.svc.set_status(f.seller, r.order.id, OrderStatus::Canceled),
            f.svc.set_status(f.seller, r.order.id, OrderStatus::Canceled),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(f.products.by_id(p.id).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn foreign_products_are_rejected() {
        let f = fixture(PlanType::Premium).await;
        let res = f.svc.place_order(order(f.seller, vec![OrderLine { product_id: Uuid::new_v4(), quantity: 1 }])).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
    }
}
