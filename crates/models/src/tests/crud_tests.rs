use crate::db::connect;
use crate::{category, news, product, subscriber, tenant, user, user_credentials, password_reset_token};
use crate::{CategoryType, PlanType, ProfileType, Role};
use anyhow::Result;
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

/// Setup test database with migrations; `None` when no database is reachable.
async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {e}");
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {e}");
        return None;
    }
    Some(db)
}

#[tokio::test]
async fn test_tenant_and_user_crud() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let suffix = Uuid::new_v4().simple().to_string();
    let t = tenant::create(&db, &format!("City {suffix}"), &format!("city-{suffix}")).await?;
    let found = tenant::Entity::find_by_id(t.id).one(&db).await?;
    assert_eq!(found.map(|x| x.slug), Some(format!("city-{suffix}")));

    let email = format!("Editor_{suffix}@Example.com");
    let u = user::create(&db, Some(t.id), &email, "Editor", Role::ContentAdmin).await?;
    assert_eq!(u.email, email.to_lowercase());
    assert_eq!(u.role(), Role::ContentAdmin);

    let creds = user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    let again = user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(creds.user_id, again.user_id);
    assert_eq!(again.password_hash, "hash-2");

    user::soft_delete(&db, u.id).await?;
    let soft = user::Entity::find_by_id(u.id).one(&db).await?.expect("user row");
    assert!(soft.deleted_at.is_some());

    user::hard_delete(&db, u.id).await?;
    assert!(user::Entity::find_by_id(u.id).one(&db).await?.is_none());
    tenant::Entity::delete_by_id(t.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_reset_token_consumed_once() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let suffix = Uuid::new_v4().simple().to_string();
    let u = user::create(&db, None, &format!("reset_{suffix}@example.com"), "Reset", Role::Subscriber).await?;
    let hash = format!("hash_{suffix}");
    password_reset_token::issue(&db, u.id, &hash, (Utc::now() + Duration::minutes(30)).into()).await?;

    assert!(password_reset_token::consume(&db, &hash).await?.is_some());
    assert!(password_reset_token::consume(&db, &hash).await?.is_none());

    user::hard_delete(&db, u.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_catalog_rows() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    let cat = category::Model {
        id: Uuid::new_v4(),
        name: "Restaurantes".into(),
        slug: format!("restaurantes-{suffix}"),
        kind: Some(CategoryType::Commercial.as_str().into()),
        parent_id: None,
        order_index: 2,
        is_active: true,
        created_at: now.into(),
        updated_at: now.into(),
    };
    category::validate(&cat)?;
    category::active_model(&cat).insert(&db).await?;

    let sub = subscriber::Model {
        id: Uuid::new_v4(),
        tenant_id: None,
        user_id: None,
        name: "Padaria Central".into(),
        email: format!("padaria_{suffix}@example.com"),
        phone: None,
        profile_type: ProfileType::Empresarial.as_str().into(),
        plan_type: PlanType::Premium.as_str().into(),
        status: "active".into(),
        category_id: Some(cat.id),
        slug: format!("padaria-central-{suffix}"),
        description: None,
        views: 0,
        created_at: now.into(),
        updated_at: now.into(),
    };
    subscriber::active_model(&sub).insert(&db).await?;

    let prod = product::Model {
        id: Uuid::new_v4(),
        subscriber_id: sub.id,
        name: "Pão de queijo".into(),
        slug: format!("pao-de-queijo-{suffix}"),
        description: None,
        price_cents: 1200,
        promo_price_cents: Some(990),
        is_promotion: true,
        stock: 40,
        tags: json!(["padaria"]),
        is_active: true,
        created_at: now.into(),
        updated_at: now.into(),
    };
    product::active_model(&prod).insert(&db).await?;

    let listed = product::Entity::find()
        .filter(product::Column::SubscriberId.eq(sub.id))
        .all(&db)
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].effective_price_cents(), 990);

    let typed = category::Entity::find()
        .filter(category::Column::Kind.eq("commercial"))
        .filter(category::Column::Id.eq(cat.id))
        .one(&db)
        .await?;
    assert!(typed.is_some());

    product::Entity::delete_by_id(prod.id).exec(&db).await?;
    subscriber::Entity::delete_by_id(sub.id).exec(&db).await?;
    category::Entity::delete_by_id(cat.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_news_json_columns_round_trip() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let now = Utc::now();
    let n = news::Model {
        id: Uuid::new_v4(),
        tenant_id: None,
        author_id: None,
        category_id: None,
        title: "Feira no centro".into(),
        slug: format!("feira-no-centro-{}", Uuid::new_v4().simple()),
        excerpt: None,
        content: "Sábado tem feira.".into(),
        cover_image: None,
        gallery: json!(["https://cdn.example.com/1.jpg"]),
        related_links: json!([{"title": "Prefeitura", "url": "https://example.com"}]),
        is_published: false,
        published_at: None,
        views: 0,
        is_active: true,
        created_at: now.into(),
        updated_at: now.into(),
    };
    news::active_model(&n).insert(&db).await?;
    let back = news::Entity::find_by_id(n.id).one(&db).await?.expect("news row");
    assert_eq!(back.gallery, n.gallery);
    assert_eq!(back.related_links, n.related_links);
    news::Entity::delete_by_id(n.id).exec(&db).await?;
    Ok(())
}
