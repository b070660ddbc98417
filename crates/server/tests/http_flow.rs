use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::{build_router, RouterOptions, ServerState};
use service::auth::AuthConfig;

const ADMIN_EMAIL: &str = "admin@portal.test";
const PASSWORD: &str = "correct-horse-9";

struct TestApp {
    base_url: String,
    client: Client,
    data_dir: PathBuf,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register_and_login(&self, email: &str) -> anyhow::Result<String> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({"email": email, "name": "Loja Centro", "password": PASSWORD}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({"email": email, "password": PASSWORD}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await?;
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".into(),
        password_algorithm: "argon2".into(),
        token_ttl_hours: 1,
        reset_token_ttl_minutes: 30,
        admin_emails: vec![ADMIN_EMAIL.into()],
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("portal_http_{}", Uuid::new_v4()));
    let state = ServerState::in_memory(&data_dir, auth_config()).await?;
    let opts = RouterOptions { frontend_dir: data_dir.join("frontend"), ..RouterOptions::default() };
    let app = build_router(state, CorsLayer::very_permissive(), opts);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok(TestApp { base_url: format!("http://{}", addr), client: Client::new(), data_dir })
}

#[tokio::test]
async fn health_and_openapi() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app.client.get(app.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["status"], "ok");

    let doc: Value = app.client.get(app.url("/api-docs/openapi.json")).send().await?.json().await?;
    assert!(doc["paths"]["/api/news"].is_object());
    Ok(())
}

#[tokio::test]
async fn subscriber_account_gets_a_free_profile() -> anyhow::Result<()> {
    let app = start_server().await?;
    let token = app.register_and_login("loja@portal.test").await?;

    let me: Value = app.client.get(app.url("/auth/me")).bearer_auth(&token).send().await?.json().await?;
    assert_eq!(me["user"]["role"], "subscriber");
    assert_eq!(me["subscriber"]["plan_type"], "gratuito");

    let allowance: Value = app
        .client
        .get(app.url("/api/me/products/allowance"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(allowance["limit"], 3);
    assert_eq!(allowance["can_add"], true);

    // free plan has no public page
    let slug = me["subscriber"]["slug"].as_str().unwrap_or_default().to_string();
    let res = app.client.get(app.url(&format!("/api/subscribers/{slug}"))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unsluggable_name_does_not_leave_an_account_behind() -> anyhow::Result<()> {
    let app = start_server().await?;
    let register = |name: &'static str| {
        app.client
            .post(app.url("/auth/register"))
            .json(&json!({"email": "sinais@portal.test", "name": name, "password": PASSWORD}))
            .send()
    };

    let res = register("!!!").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({"email": "sinais@portal.test", "password": PASSWORD}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = register("Ateliê Sinais").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({"email": "sinais@portal.test", "password": PASSWORD}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_staff_role() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app.client.get(app.url("/admin/subscribers")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = app.register_and_login("cliente@portal.test").await?;
    let res = app.client.get(app.url("/admin/subscribers")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({"sub": "x@y.z", "uid": Uuid::new_v4(), "role": "master", "exp": 4_102_444_800u64}),
        &jsonwebtoken::EncodingKey::from_secret(b"wrong-secret"),
    )?;
    let res = app.client.get(app.url("/admin/subscribers")).bearer_auth(&forged).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn published_news_counts_views_and_lands_in_audit_log() -> anyhow::Result<()> {
    let app = start_server().await?;
    let token = app.register_and_login(ADMIN_EMAIL).await?;

    let res = app
        .client
        .post(app.url("/admin/news"))
        .bearer_auth(&token)
        .json(&json!({"title": "Feira de Artesanato", "content": "Sábado na praça.", "publish": true}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert_eq!(created["slug"], "feira-de-artesanato");

    for expected in [1, 2] {
        let detail: Value = app.client.get(app.url("/api/news/feira-de-artesanato")).send().await?.json().await?;
        assert_eq!(detail["views"], expected);
    }

    let list: Value = app.client.get(app.url("/api/news")).send().await?.json().await?;
    assert_eq!(list["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(list["page"], 1);

    let log: Value = app.client.get(app.url("/admin/audit-log")).bearer_auth(&token).send().await?.json().await?;
    assert_eq!(log["items"][0]["action"], "create");

    let id = created["id"].as_str().unwrap_or_default();
    let res = app.client.delete(app.url(&format!("/admin/news/{id}"))).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.client.get(app.url("/api/news/feira-de-artesanato")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn categories_by_type() -> anyhow::Result<()> {
    let app = start_server().await?;
    let token = app.register_and_login(ADMIN_EMAIL).await?;
    for (name, kind) in [("Restaurantes", "commercial"), ("Advocacia", "professional")] {
        let res = app
            .client
            .post(app.url("/admin/categories"))
            .bearer_auth(&token)
            .json(&json!({"name": name, "type": kind}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    let rows: Value = app.client.get(app.url("/api/categories?type=commercial")).send().await?.json().await?;
    let names: Vec<&str> = rows.as_array().into_iter().flatten().filter_map(|c| c["name"].as_str()).collect();
    assert_eq!(names, vec!["Restaurantes"]);

    let res = app.client.get(app.url("/api/categories/tree")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn local_collection_crud() -> anyhow::Result<()> {
    let app = start_server().await?;
    let token = app.register_and_login(ADMIN_EMAIL).await?;

    let res = app
        .client
        .post(app.url("/admin/local/jobs"))
        .bearer_auth(&token)
        .json(&json!({"title": "Caixa", "salary": 1800}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let job: Value = res.json().await?;
    let id = job["id"].as_str().unwrap_or_default().to_string();

    let updated: Value = app
        .client
        .put(app.url(&format!("/admin/local/jobs/{id}")))
        .bearer_auth(&token)
        .json(&json!({"salary": null, "city": "Campinas"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated["title"], "Caixa");
    assert_eq!(updated["city"], "Campinas");
    assert!(updated.get("salary").is_none());

    let public: Value = app.client.get(app.url("/api/directory/ppo_jobs")).send().await?.json().await?;
    assert_eq!(public.as_array().map(Vec::len), Some(1));

    let res = app.client.get(app.url("/api/directory/unknown")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.client.delete(app.url(&format!("/admin/local/jobs/{id}"))).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn address_lookup_rejects_malformed_codes() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app.client.get(app.url("/api/address/123")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.client.get(app.url("/api/address/01310-100")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn checkout_needs_a_store_plan() -> anyhow::Result<()> {
    let app = start_server().await?;
    let token = app.register_and_login("vendas@portal.test").await?;
    let product: Value = app
        .client
        .post(app.url("/api/me/products"))
        .bearer_auth(&token)
        .json(&json!({"name": "Bolo de Milho", "price_cents": 2500, "stock": 4}))
        .send()
        .await?
        .json()
        .await?;
    let res = app
        .client
        .post(app.url("/api/orders"))
        .json(&json!({
            "seller_id": product["subscriber_id"],
            "buyer_name": "Ana",
            "buyer_email": "ana@exemplo.com",
            "buyer_phone": "11999990000",
            "payment_method": "pix",
            "items": [{"product_id": product["id"], "quantity": 1}]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
