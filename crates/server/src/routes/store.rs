//! Checkout, seller order handling and plan contracts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use common::types::Page;
use models::{contract, order, OrderStatus};
use service::audit::AuditEntry;
use service::auth::AuthUser;
use service::contract::PlanChangeRequest;
use service::order::{OrderInput, OrderReceipt};
use service::plans::{self, PlanFeatures};
use service::Pagination;

use super::directory::current_subscriber;
use super::PageQuery;
use crate::auth::ensure_platform_admin;
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

/// Guest checkout against one seller's store.
#[utoipa::path(post, path = "/api/orders", tag = "store", responses((status = 201, description = "Order placed"), (status = 403, description = "Seller plan has no store"), (status = 409, description = "Insufficient stock")))]
pub async fn place_order(State(state): State<ServerState>, Json(input): Json<OrderInput>) -> Result<(StatusCode, Json<OrderReceipt>), JsonApiError> {
    let receipt = state.orders.place_order(input).await?;
    info!(order_id = %receipt.order.id, seller_id = %receipt.order.subscriber_id, "order placed");
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(get, path = "/api/plans", tag = "store", responses((status = 200, description = "Plan catalog in upgrade order")))]
pub async fn plans() -> Json<Vec<PlanFeatures>> {
    Json(plans::catalog())
}

pub async fn my_orders(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<order::Model>>, JsonApiError> {
    let page = Pagination::from(page);
    let mine = current_subscriber(&state, &user).await?;
    let items = state.orders.list_for_seller(mine.id, page).await?;
    Ok(Json(page.wrap(items)))
}

pub async fn order_detail(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderReceipt>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.orders.get_for_seller(mine.id, id).await?))
}

pub async fn set_order_status(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<OrderReceipt>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.orders.set_status(mine.id, id, body.status).await?))
}

pub async fn my_contracts(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<contract::Model>>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.contracts.list_for_subscriber(mine.id).await?))
}

pub async fn request_plan_change(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PlanChangeRequest>,
) -> Result<(StatusCode, Json<contract::Model>), JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    let created = state.contracts.request_change(mine.id, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn cancel_contract(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<contract::Model>, JsonApiError> {
    let mine = current_subscriber(&state, &user).await?;
    Ok(Json(state.contracts.cancel(mine.id, id).await?))
}

/// Payment confirmed out of band; applies the contracted plan.
pub async fn activate_contract(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<contract::Model>, JsonApiError> {
    ensure_platform_admin(&user)?;
    let activated = state.contracts.activate(id).await?;
    state
        .audit
        .record_quietly(
            AuditEntry::new(Some(user.id), "activate", "contract", Some(id))
                .details(json!({"subscriber_id": activated.subscriber_id, "to_plan": activated.to_plan})),
        )
        .await;
    Ok(Json(activated))
}
