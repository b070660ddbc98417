//! News and events: public listings with view counting, admin editing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use common::types::Page;
use models::{event, news, Role};
use service::audit::AuditEntry;
use service::auth::AuthUser;
use service::content::ContentFilter;
use service::events::EventInput;
use service::news::NewsInput;
use service::Pagination;

use super::PageQuery;
use crate::auth::scoped_tenant;
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentQuery {
    pub tenant_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Events only; defaults to true.
    pub upcoming: Option<bool>,
}

/// Admin write body: the entity fields plus an optional target tenant.
#[derive(Debug, Deserialize)]
pub struct Scoped<T> {
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    #[serde(flatten)]
    pub input: T,
}

#[derive(Debug, Deserialize)]
pub struct PublishBody {
    pub published: bool,
}

/// Franchisees may only touch rows of their own tenant.
fn ensure_tenant_access(user: &AuthUser, row_tenant: Option<Uuid>) -> Result<(), JsonApiError> {
    if user.role == Role::Franchisee && row_tenant != user.tenant_id {
        return Err(JsonApiError::forbidden("row belongs to another tenant"));
    }
    Ok(())
}

#[utoipa::path(get, path = "/api/news", tag = "content", params(ContentQuery, PageQuery), responses((status = 200, description = "Published news, newest first")))]
pub async fn list_news(
    State(state): State<ServerState>,
    Query(q): Query<ContentQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<news::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let filter = ContentFilter { tenant_id: q.tenant_id, category_id: q.category_id, ..ContentFilter::public() };
    let items = state.news.list(filter, page).await?;
    Ok(Json(page.wrap(items)))
}

#[utoipa::path(get, path = "/api/news/{slug}", tag = "content", params(("slug" = String, Path, description = "News slug")), responses((status = 200, description = "Article; counts one view"), (status = 404, description = "Not Found")))]
pub async fn news_detail(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<news::Model>, JsonApiError> {
    Ok(Json(state.news.get_by_slug_and_count_view(&slug).await?))
}

pub async fn create_news(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Scoped<NewsInput>>,
) -> Result<(StatusCode, Json<news::Model>), JsonApiError> {
    let tenant = scoped_tenant(&user, body.tenant_id);
    let created = state.news.create(tenant, Some(user.id), body.input).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "create", "news", Some(created.id)).details(json!({"slug": created.slug})))
        .await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_news(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewsInput>,
) -> Result<Json<news::Model>, JsonApiError> {
    ensure_tenant_access(&user, state.news.get(id).await?.tenant_id)?;
    let updated = state.news.update(id, input).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "update", "news", Some(id))).await;
    Ok(Json(updated))
}

pub async fn publish_news(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<PublishBody>,
) -> Result<Json<news::Model>, JsonApiError> {
    ensure_tenant_access(&user, state.news.get(id).await?.tenant_id)?;
    let updated = state.news.set_published(id, body.published).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "publish", "news", Some(id)).details(json!({"published": body.published})))
        .await;
    Ok(Json(updated))
}

pub async fn delete_news(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    ensure_tenant_access(&user, state.news.get(id).await?.tenant_id)?;
    state.news.soft_delete(id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "delete", "news", Some(id))).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/events", tag = "content", params(ContentQuery, PageQuery), responses((status = 200, description = "Published events by start date")))]
pub async fn list_events(
    State(state): State<ServerState>,
    Query(q): Query<ContentQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<event::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let filter = ContentFilter {
        tenant_id: q.tenant_id,
        category_id: q.category_id,
        upcoming: q.upcoming.unwrap_or(true),
        ..ContentFilter::public()
    };
    let items = state.events.list(filter, page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn event_detail(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<event::Model>, JsonApiError> {
    Ok(Json(state.events.get_by_slug_and_count_view(&slug).await?))
}

pub async fn create_event(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Scoped<EventInput>>,
) -> Result<(StatusCode, Json<event::Model>), JsonApiError> {
    let tenant = scoped_tenant(&user, body.tenant_id);
    let created = state.events.create(tenant, Some(user.id), body.input).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "create", "event", Some(created.id)).details(json!({"slug": created.slug})))
        .await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_event(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<EventInput>,
) -> Result<Json<event::Model>, JsonApiError> {
    ensure_tenant_access(&user, state.events.get(id).await?.tenant_id)?;
    let updated = state.events.update(id, input).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "update", "event", Some(id))).await;
    Ok(Json(updated))
}

pub async fn publish_event(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<PublishBody>,
) -> Result<Json<event::Model>, JsonApiError> {
    ensure_tenant_access(&user, state.events.get(id).await?.tenant_id)?;
    let updated = state.events.set_published(id, body.published).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "publish", "event", Some(id)).details(json!({"published": body.published})))
        .await;
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    ensure_tenant_access(&user, state.events.get(id).await?.tenant_id)?;
    state.events.soft_delete(id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "delete", "event", Some(id))).await;
    Ok(StatusCode::NO_CONTENT)
}
