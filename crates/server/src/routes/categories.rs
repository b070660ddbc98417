use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use models::{category, CategoryType};
use service::audit::AuditEntry;
use service::auth::AuthUser;
use service::category::{CategoryInput, CategoryNode};

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TypeQuery {
    /// commercial, professional, news, event, job or forum
    #[serde(rename = "type")]
    #[param(value_type = Option<String>)]
    pub kind: Option<CategoryType>,
}

/// Active categories of one type, or every category when no type is given.
#[utoipa::path(get, path = "/api/categories", tag = "categories", params(TypeQuery), responses((status = 200, description = "Categories ordered by position")))]
pub async fn list(State(state): State<ServerState>, Query(q): Query<TypeQuery>) -> Result<Json<Vec<category::Model>>, JsonApiError> {
    let rows = match q.kind {
        Some(kind) => state.categories.get_categories_by_type(kind).await?,
        None => state.categories.list_all().await?,
    };
    Ok(Json(rows))
}

pub async fn tree(State(state): State<ServerState>, Query(q): Query<TypeQuery>) -> Result<Json<Vec<CategoryNode>>, JsonApiError> {
    let kind = q.kind.ok_or_else(|| JsonApiError::bad_request("type query parameter is required"))?;
    Ok(Json(state.categories.tree(kind).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<category::Model>), JsonApiError> {
    let created = state.categories.create(input).await?;
    state
        .audit
        .record_quietly(AuditEntry::new(Some(user.id), "create", "category", Some(created.id)).details(json!({"name": created.name})))
        .await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<category::Model>, JsonApiError> {
    let updated = state.categories.update(id, input).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "update", "category", Some(id))).await;
    Ok(Json(updated))
}

pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.categories.deactivate(id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "deactivate", "category", Some(id))).await;
    Ok(StatusCode::NO_CONTENT)
}
