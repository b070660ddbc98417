//! Request authentication: bearer token or `auth_token` cookie.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use models::Role;
use service::auth::AuthUser;

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

fn bearer_or_cookie(headers: &HeaderMap) -> Option<String> {
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h.strip_prefix("Bearer ").map(|t| t.trim().to_string());
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from the request headers.
pub async fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<AuthUser, JsonApiError> {
    let token = bearer_or_cookie(headers).ok_or_else(JsonApiError::unauthorized)?;
    let claims = state.auth.verify_token(&token)?;
    Ok(state.auth.current_user(&claims).await?)
}

/// Any signed-in user; the resolved [`AuthUser`] goes into request extensions.
pub async fn require_auth(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Staff roles only (`master`, `general_admin`, `content_admin`, `franchisee`).
pub async fn require_admin(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let user = authenticate(&state, req.headers()).await?;
    if !user.role.is_admin() {
        warn!(user_id = %user.id, path = %req.uri().path(), "admin route denied");
        return Err(JsonApiError::forbidden("admin role required"));
    }
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Audit log and contract activation are reserved to `master` and `general_admin`.
pub fn ensure_platform_admin(user: &AuthUser) -> Result<(), JsonApiError> {
    if user.role.is_platform_admin() {
        Ok(())
    } else {
        Err(JsonApiError::forbidden("platform admin role required"))
    }
}

/// Franchisees always write into their own tenant; other staff may choose.
pub fn scoped_tenant(user: &AuthUser, requested: Option<Uuid>) -> Option<Uuid> {
    match user.role {
        Role::Franchisee => user.tenant_id,
        _ => requested.or(user.tenant_id),
    }
}
