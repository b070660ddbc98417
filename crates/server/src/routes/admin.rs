//! Platform administration: subscriber oversight, the audit log and the
//! file-backed `ppo_*` collections.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use common::types::Page;
use models::{audit_log, subscriber};
use service::audit::AuditEntry;
use service::auth::AuthUser;
use service::local_store::{LocalCollection, LocalRecord};
use service::subscriber::DirectoryFilter;
use service::Pagination;

use super::directory::DirectoryQuery;
use super::PageQuery;
use crate::auth::{ensure_platform_admin, scoped_tenant};
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Read-only view of a local collection for the public site.
#[utoipa::path(get, path = "/api/directory/{collection}", tag = "local", params(("collection" = String, Path, description = "companies, professionals, blog-posts, team or jobs")), responses((status = 200, description = "Records, oldest first"), (status = 404, description = "Unknown collection")))]
pub async fn public_collection(State(state): State<ServerState>, Path(collection): Path<String>) -> Result<Json<Vec<LocalRecord>>, JsonApiError> {
    let c: LocalCollection = collection.parse()?;
    Ok(Json(state.local.list(c).await?))
}

/// Every subscriber including inactive ones; franchisees see their tenant only.
#[utoipa::path(get, path = "/admin/subscribers", tag = "admin", params(DirectoryQuery, PageQuery), responses((status = 200, description = "Subscribers, alphabetical"), (status = 403, description = "Forbidden")))]
pub async fn list_subscribers(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<DirectoryQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<subscriber::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let filter = DirectoryFilter {
        tenant_id: scoped_tenant(&user, filter.tenant_id),
        include_inactive: true,
        ..DirectoryFilter::from(filter)
    };
    let items = state.subscribers.directory(filter, page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn deactivate_subscriber(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<subscriber::Model>, JsonApiError> {
    let target = state.subscribers.get(id).await?;
    if user.role == models::Role::Franchisee && target.tenant_id != user.tenant_id {
        return Err(JsonApiError::forbidden("subscriber belongs to another tenant"));
    }
    let updated = state.subscribers.deactivate(id).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "deactivate", "subscriber", Some(id)).details(json!({"slug": updated.slug})))
        .await;
    Ok(Json(updated))
}

#[utoipa::path(get, path = "/admin/audit-log", tag = "admin", params(PageQuery), responses((status = 200, description = "Newest entries first"), (status = 403, description = "Forbidden")))]
pub async fn audit_log(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<audit_log::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    ensure_platform_admin(&user)?;
    let items = state.audit.list(page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn list_local(State(state): State<ServerState>, Path(collection): Path<String>) -> Result<Json<Vec<LocalRecord>>, JsonApiError> {
    let c: LocalCollection = collection.parse()?;
    Ok(Json(state.local.list(c).await?))
}

#[utoipa::path(post, path = "/admin/local/{collection}", tag = "local", request_body = crate::openapi::LocalRecordDoc, responses((status = 201, description = "Created"), (status = 400, description = "Body is not a JSON object")))]
pub async fn create_local(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<LocalRecord>), JsonApiError> {
    let c: LocalCollection = collection.parse()?;
    let created = state.local.create(c, body).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "create", c.key(), Some(created.id)))
        .await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Shallow merge; a `null` field removes that key.
pub async fn update_local(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path((collection, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> Result<Json<LocalRecord>, JsonApiError> {
    let c: LocalCollection = collection.parse()?;
    let updated = state.local.update(c, id, body).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "update", c.key(), Some(id))).await;
    Ok(Json(updated))
}

pub async fn delete_local(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, JsonApiError> {
    let c: LocalCollection = collection.parse()?;
    state.local.delete(c, id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "delete", c.key(), Some(id))).await;
    Ok(StatusCode::NO_CONTENT)
}
