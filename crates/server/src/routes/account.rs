use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use models::{subscriber, Role};
use service::auth::{AuthUser, LoginInput, RegisterInput};

use crate::auth::AUTH_COOKIE;
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub user: AuthUser,
    pub subscriber: Option<subscriber::Model>,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirm {
    pub token: String,
    pub password: String,
}

/// Subscriber accounts get their directory profile right away.
async fn ensure_profile(state: &ServerState, user: &AuthUser) -> Result<Option<subscriber::Model>, JsonApiError> {
    if user.role != Role::Subscriber {
        return Ok(state.subscribers.find_by_user(user.id).await?);
    }
    let sub = state
        .subscribers
        .ensure_for_user(user.tenant_id, user.id, &user.name, &user.email)
        .await?;
    Ok(Some(sub))
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    // the profile slug comes from the name; reject it before the account exists
    service::slug::slugify(&input.name)?;
    let user = state.auth.register(input).await?;
    ensure_profile(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    if let Err(e) = ensure_profile(&state, &session.user).await {
        warn!(user_id = %session.user.id, error = ?e, "profile setup failed at login");
    }

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(LoginOutput { user: session.user, token: session.token })))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<ServerState>, Extension(user): Extension<AuthUser>) -> Result<Json<MeOutput>, JsonApiError> {
    let subscriber = state.subscribers.find_by_user(user.id).await?;
    Ok(Json(MeOutput { user, subscriber }))
}

/// Always 202 so the endpoint does not reveal which emails exist.
pub async fn request_password_reset(State(state): State<ServerState>, Json(input): Json<ResetRequest>) -> Result<StatusCode, JsonApiError> {
    if let Some(token) = state.auth.request_password_reset(&input.email).await? {
        // no mail transport here; the token is only visible at debug level
        debug!(email = %input.email, %token, "password reset token issued");
    }
    Ok(StatusCode::ACCEPTED)
}

pub async fn confirm_password_reset(State(state): State<ServerState>, Json(input): Json<ResetConfirm>) -> Result<StatusCode, JsonApiError> {
    state.auth.reset_password(&input.token, &input.password).await?;
    info!("password reset confirmed");
    Ok(StatusCode::NO_CONTENT)
}
