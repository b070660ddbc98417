use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use serde::Deserialize;
use tracing::Level;

use common::types::Health;
use service::Pagination;

use crate::auth::{require_admin, require_auth};
use crate::state::ServerState;

pub mod account;
pub mod admin;
pub mod catalog;
pub mod categories;
pub mod comments;
pub mod content;
pub mod directory;
pub mod lookup;
pub mod store;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// `?page=&per_page=` for list endpoints; missing values take the defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based
    pub page: Option<u32>,
    /// at most 100
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let d = Pagination::default();
        Pagination { page: q.page.unwrap_or(d.page), per_page: q.per_page.unwrap_or(d.per_page) }
    }
}

/// Router knobs taken from `[server]` and `[portal]`.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub frontend_dir: PathBuf,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            frontend_dir: PathBuf::from("frontend"),
            body_limit_bytes: 8 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RouterOptions {
    pub fn from_config(cfg: &configs::AppConfig) -> Self {
        Self {
            frontend_dir: PathBuf::from(&cfg.portal.frontend_dir),
            body_limit_bytes: cfg.server.body_limit_mb * 1024 * 1024,
            request_timeout: Duration::from_secs(cfg.server.request_timeout_secs),
        }
    }
}

/// Build the full application router: public, signed-in, admin, then the SPA fallback.
pub fn build_router(state: ServerState, cors: CorsLayer, opts: RouterOptions) -> Router {
    let index = opts.frontend_dir.join("index.html");
    let spa = ServeDir::new(&opts.frontend_dir).fallback(ServeFile::new(index));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(crate::openapi::openapi_json))
        .route("/auth/register", post(account::register))
        .route("/auth/login", post(account::login))
        .route("/auth/logout", post(account::logout))
        .route("/auth/password-reset", post(account::request_password_reset))
        .route("/auth/password-reset/confirm", post(account::confirm_password_reset))
        .route("/api/news", get(content::list_news))
        .route("/api/news/:slug", get(content::news_detail))
        .route("/api/events", get(content::list_events))
        .route("/api/events/:slug", get(content::event_detail))
        .route("/api/categories", get(categories::list))
        .route("/api/categories/tree", get(categories::tree))
        .route("/api/subscribers", get(directory::list))
        .route("/api/subscribers/:key", get(directory::public_page))
        .route("/api/subscribers/:key/products", get(catalog::storefront))
        .route("/api/products/promotions", get(catalog::promotions))
        .route("/api/products/:slug", get(catalog::product_detail))
        .route("/api/comments", get(comments::list).post(comments::submit))
        .route("/api/orders", post(store::place_order))
        .route("/api/plans", get(store::plans))
        .route("/api/address/:postal_code", get(lookup::address))
        .route("/api/directory/:collection", get(admin::public_collection));

    let signed_in = Router::new()
        .route("/auth/me", get(account::me))
        .route("/api/me/subscriber", get(directory::my_subscriber).put(directory::update_my_subscriber))
        .route("/api/me/products", get(catalog::my_products).post(catalog::create_product))
        .route("/api/me/products/allowance", get(catalog::allowance))
        .route("/api/me/products/:id", put(catalog::update_product).delete(catalog::delete_product))
        .route("/api/me/orders", get(store::my_orders))
        .route("/api/me/orders/:id", get(store::order_detail))
        .route("/api/me/orders/:id/status", put(store::set_order_status))
        .route("/api/me/contracts", get(store::my_contracts).post(store::request_plan_change))
        .route("/api/me/contracts/:id", delete(store::cancel_contract))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/admin/news", post(content::create_news))
        .route("/admin/news/:id", put(content::update_news).delete(content::delete_news))
        .route("/admin/news/:id/publish", put(content::publish_news))
        .route("/admin/events", post(content::create_event))
        .route("/admin/events/:id", put(content::update_event).delete(content::delete_event))
        .route("/admin/events/:id/publish", put(content::publish_event))
        .route("/admin/categories", post(categories::create))
        .route("/admin/categories/:id", put(categories::update).delete(categories::deactivate))
        .route("/admin/subscribers", get(admin::list_subscribers))
        .route("/admin/subscribers/:id", delete(admin::deactivate_subscriber))
        .route("/admin/comments/pending", get(comments::pending))
        .route("/admin/comments/:id/approve", put(comments::approve))
        .route("/admin/comments/:id", delete(comments::reject))
        .route("/admin/contracts/:id/activate", put(store::activate_contract))
        .route("/admin/audit-log", get(admin::audit_log))
        .route("/admin/local/:collection", get(admin::list_local).post(admin::create_local))
        .route("/admin/local/:collection/:id", put(admin::update_local).delete(admin::delete_local))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    public
        .merge(signed_in)
        .merge(admin_routes)
        .fallback_service(spa)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(opts.body_limit_bytes))
        .layer(TimeoutLayer::new(opts.request_timeout))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
