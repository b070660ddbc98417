//! Products: public storefronts and promotions, owner-side management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use common::types::Page;
use models::product;
use service::auth::AuthUser;
use service::plans::ProductAllowance;
use service::product::ProductInput;
use service::Pagination;

use super::directory::current_subscriber;
use super::PageQuery;
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Active products of one subscriber, by subscriber id.
#[utoipa::path(get, path = "/api/subscribers/{key}/products", tag = "catalog", params(("key" = Uuid, Path, description = "Subscriber id")), responses((status = 200, description = "Active products")))]
pub async fn storefront(State(state): State<ServerState>, Path(subscriber_id): Path<Uuid>) -> Result<Json<Vec<product::Model>>, JsonApiError> {
    Ok(Json(state.products.storefront(subscriber_id).await?))
}

#[utoipa::path(get, path = "/api/products/promotions", tag = "catalog", params(PageQuery), responses((status = 200, description = "Products on promotion")))]
pub async fn promotions(State(state): State<ServerState>, Query(page): Query<PageQuery>) -> Result<Json<Page<product::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let items = state.products.promotions(page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn product_detail(State(state): State<ServerState>, Path(slug): Path<String>) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.get_by_slug(&slug).await?))
}

pub async fn my_products(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<product::Model>>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.products.list_mine(mine.id).await?))
}

pub async fn allowance(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProductAllowance>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.products.allowance(mine.id).await?))
}

pub async fn create_product(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<product::Model>), JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    let created = state.products.create(mine.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Result<Json<product::Model>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.products.update(mine.id, id, input).await?))
}

pub async fn delete_product(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    state.products.deactivate(mine.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
