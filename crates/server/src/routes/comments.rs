use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::{comment, CommentTarget};
use service::audit::AuditEntry;
use service::auth::AuthUser;
use service::comment::CommentInput;
use service::Pagination;

use super::PageQuery;
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TargetQuery {
    /// news, event, product or subscriber
    #[param(value_type = String)]
    pub target_type: CommentTarget,
    pub target_id: Uuid,
}

/// Approved comments on one target, oldest first.
#[utoipa::path(get, path = "/api/comments", tag = "comments", params(TargetQuery), responses((status = 200, description = "Approved comments")))]
pub async fn list(State(state): State<ServerState>, Query(q): Query<TargetQuery>) -> Result<Json<Vec<comment::Model>>, JsonApiError> {
    Ok(Json(state.comments.list_approved(q.target_type, q.target_id).await?))
}

/// Anyone may comment; the comment stays hidden until approved.
pub async fn submit(State(state): State<ServerState>, Json(input): Json<CommentInput>) -> Result<(StatusCode, Json<comment::Model>), JsonApiError> {
    let created = state.comments.submit(input).await?;
    Ok((StatusCode::ACCEPTED, Json(created)))
}

pub async fn pending(State(state): State<ServerState>, Query(page): Query<PageQuery>) -> Result<Json<Page<comment::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let items = state.comments.pending_queue(page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn approve(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<comment::Model>, JsonApiError> {
    let approved = state.comments.approve(id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "approve", "comment", Some(id))).await;
    Ok(Json(approved))
}

pub async fn reject(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.comments.delete(id).await?;
    state.audit.record_quietly(AuditEntry::new(Some(user.id), "reject", "comment", Some(id))).await;
    Ok(StatusCode::NO_CONTENT)
}
