use axum::{
    extract::{Path, State},
    Json,
};

use service::address::Address;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Street address for a Brazilian postal code (CEP).
#[utoipa::path(get, path = "/api/address/{postal_code}", tag = "lookup", params(("postal_code" = String, Path, description = "Eight digits, punctuation ignored")), responses((status = 200, description = "Address"), (status = 400, description = "Malformed postal code"), (status = 404, description = "Unknown postal code"), (status = 502, description = "Lookup service unavailable")))]
pub async fn address(State(state): State<ServerState>, Path(postal_code): Path<String>) -> Result<Json<Address>, JsonApiError> {
    Ok(Json(state.address.lookup(&postal_code).await?))
}
