//! Repository behaviour against a real PostgreSQL; skipped without one.

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use models::{CategoryType, OrderStatus, PaymentMethod, PlanType, ProfileType};

use crate::category::{CategoryInput, CategoryService, SeaOrmCategoryRepository};
use crate::errors::ServiceError;
use crate::news::{NewsInput, NewsService, SeaOrmNewsRepository};
use crate::order::{OrderInput, OrderLine, OrderRepository, OrderService, SeaOrmOrderRepository};
use crate::product::{ProductInput, ProductService, SeaOrmProductRepository};
use crate::subscriber::{SeaOrmSubscriberRepository, SubscriberInput, SubscriberService};
use crate::test_support::get_db;

fn news(title: &str) -> NewsInput {
    NewsInput {
        title: title.into(),
        content: "Texto completo da matéria.".into(),
        publish: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn same_title_gets_distinct_slugs_and_views_grow() {
    let Some(db) = get_db().await else { return };
    let svc = NewsService::new(Arc::new(SeaOrmNewsRepository::new(db)));
    let title = format!("Feira de artesanato {}", Uuid::new_v4().simple());
    let a = svc.create(None, None, news(&title)).await.unwrap();
    let b = svc.create(None, None, news(&title)).await.unwrap();
    assert_ne!(a.slug, b.slug);
    assert!(b.slug.starts_with(&a.slug));

    let first = svc.get_by_slug_and_count_view(&a.slug).await.unwrap();
    let second = svc.get_by_slug_and_count_view(&a.slug).await.unwrap();
    assert!(second.views > first.views);
}

#[tokio::test]
async fn checkout_is_atomic_in_postgres() {
    let Some(db) = get_db().await else { return };
    let subs = Arc::new(SeaOrmSubscriberRepository::new(db.clone()));
    let products = Arc::new(SeaOrmProductRepository::new(db.clone()));
    let seller = SubscriberService::new(subs.clone())
        .register(
            None,
            None,
            SubscriberInput {
                name: format!("Mercado {}", Uuid::new_v4().simple()),
                email: "mercado@example.com".into(),
                phone: None,
                profile_type: ProfileType::Empresarial,
                plan_type: PlanType::Premium,
                category_id: None,
                description: None,
            },
        )
        .await
        .unwrap();
    let catalog = ProductService::new(products.clone(), subs.clone());
    let cafe = catalog.create(seller.id, ProductInput { name: "Café".into(), price_cents: 2500, stock: 5, ..Default::default() }).await.unwrap();
    let mel = catalog.create(seller.id, ProductInput { name: "Mel".into(), price_cents: 3000, stock: 1, ..Default::default() }).await.unwrap();

    let order_repo = Arc::new(SeaOrmOrderRepository { db });
    let orders = OrderService::new(order_repo.clone(), products.clone(), subs);
    let input = |qty| OrderInput {
        seller_id: seller.id,
        buyer_name: "Rita".into(),
        buyer_email: "rita@example.com".into(),
        buyer_phone: None,
        shipping_address: None,
        payment_method: PaymentMethod::Card,
        items: vec![OrderLine { product_id: cafe.id, quantity: 2 }, OrderLine { product_id: mel.id, quantity: qty }],
    };

    assert!(matches!(orders.place_order(input(2)).await, Err(ServiceError::Conflict(_))));
    assert_eq!(products.by_id(cafe.id).await.unwrap().unwrap().stock, 5);

    let receipt = orders.place_order(input(1)).await.unwrap();
    assert_eq!(receipt.order.total_cents, 8000);
    assert_eq!(products.by_id(cafe.id).await.unwrap().unwrap().stock, 3);

    orders.set_status(seller.id, receipt.order.id, OrderStatus::Canceled).await.unwrap();
    assert_eq!(products.by_id(mel.id).await.unwrap().unwrap().stock, 1);

    // a second cancel that still believes the order is pending
    let stale = order_repo.set_status(receipt.order.id, OrderStatus::Pending, OrderStatus::Canceled, true).await;
    assert!(matches!(stale, Err(ServiceError::Conflict(_))));
    assert_eq!(products.by_id(cafe.id).await.unwrap().unwrap().stock, 5);
}

#[tokio::test]
async fn creates_and_reads_without_optional_columns() {
    let Some(db) = get_db().await else { return };
    db.execute_unprepared("ALTER TABLE news DROP COLUMN IF EXISTS gallery").await.unwrap();
    let svc = NewsService::new(Arc::new(SeaOrmNewsRepository::new(db.clone())));
    let mut input = news(&format!("Mutirão de limpeza {}", Uuid::new_v4().simple()));
    input.gallery = vec!["https://cdn.example.com/praia.jpg".into()];
    let created = svc.create(None, None, input).await;
    let viewed = match &created {
        Ok(n) => Some(svc.get_by_slug_and_count_view(&n.slug).await),
        Err(_) => None,
    };
    db.execute_unprepared("ALTER TABLE news ADD COLUMN IF NOT EXISTS gallery jsonb NOT NULL DEFAULT '[]'::jsonb")
        .await
        .unwrap();
    let created = created.unwrap();
    assert_eq!(created.gallery, serde_json::json!([]));
    assert_eq!(viewed.unwrap().unwrap().views, 1);

    db.execute_unprepared("ALTER TABLE categories DROP COLUMN IF EXISTS type").await.unwrap();
    let cats = CategoryService::new(Arc::new(SeaOrmCategoryRepository::new(db.clone())));
    let input = CategoryInput {
        name: format!("Praias {}", Uuid::new_v4().simple()),
        kind: Some(CategoryType::Event),
        parent_id: None,
        order_index: 0,
        is_active: None,
    };
    let created = cats.create(input).await;
    let fetched = match &created {
        Ok(c) => Some(cats.get(c.id).await),
        Err(_) => None,
    };
    db.execute_unprepared("ALTER TABLE categories ADD COLUMN IF NOT EXISTS type varchar(32)").await.unwrap();
    let created = created.unwrap();
    assert_eq!(created.kind, None);
    assert_eq!(fetched.unwrap().unwrap().id, created.id);
}
