//! Subscriber directory and the signed-in subscriber's own profile.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::{subscriber, ProfileType};
use service::auth::AuthUser;
use service::subscriber::{DirectoryFilter, ProfileUpdate};
use service::Pagination;

use super::PageQuery;
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DirectoryQuery {
    pub tenant_id: Option<Uuid>,
    /// empresarial or profissional
    #[param(value_type = Option<String>)]
    pub profile_type: Option<ProfileType>,
    pub category_id: Option<Uuid>,
}

impl From<DirectoryQuery> for DirectoryFilter {
    fn from(q: DirectoryQuery) -> Self {
        DirectoryFilter { tenant_id: q.tenant_id, profile_type: q.profile_type, category_id: q.category_id, include_inactive: false }
    }
}

/// The subscriber owned by the caller; 404 when the account has none.
pub(crate) async fn current_subscriber(state: &ServerState, user: &AuthUser) -> Result<subscriber::Model, JsonApiError> {
    state
        .subscribers
        .find_by_user(user.id)
        .await?
        .ok_or_else(|| JsonApiError::from(service::ServiceError::not_found("subscriber")))
}

#[utoipa::path(get, path = "/api/subscribers", tag = "directory", params(DirectoryQuery, PageQuery), responses((status = 200, description = "Active subscribers, alphabetical")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<DirectoryQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<subscriber::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let items = state.subscribers.directory(filter.into(), page).await?;
    Ok(Json(page.wrap(items)))
}

/// Public page by slug; counts one view.
#[utoipa::path(get, path = "/api/subscribers/{key}", tag = "directory", params(("key" = String, Path, description = "Subscriber slug")), responses((status = 200, description = "Public page"), (status = 404, description = "Unknown slug or plan without a public page")))]
pub async fn public_page(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<subscriber::Model>, JsonApiError> {
    Ok(Json(state.subscribers.public_page(&slug).await?))
}

pub async fn my_subscriber(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<subscriber::Model>, JsonApiError> {
    Ok(Json(current_subscriber(&state, &user).await?))
}

pub async fn update_my_subscriber(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<subscriber::Model>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.subscribers.update_profile(mine.id, update).await?))
}
