use std::sync::Arc;

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use models::Role;

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
    pub reset_token_ttl_minutes: i64,
    /// Registrations with these emails receive the `master` role.
    pub admin_emails: Vec<String>,
}

impl AuthConfig {
    pub fn from_portal(cfg: &configs::PortalConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            password_algorithm: "argon2".into(),
            token_ttl_hours: cfg.token_ttl_hours,
            reset_token_ttl_minutes: cfg.reset_token_ttl_minutes,
            admin_emails: cfg.admin_emails.iter().map(|e| e.trim().to_lowercase()).collect(),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn check_password_strength(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

/// Hex sha256; only digests of reset tokens are stored.
fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::memory::MemoryAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MemoryAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), password_algorithm: "argon2".into(), token_ttl_hours: 12, reset_token_ttl_minutes: 30, admin_emails: vec![] };
    /// let svc = AuthService::new(repo, cfg);
    /// let input = RegisterInput { tenant_id: None, email: "user@example.com".into(), name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, tenant_id = ?input.tenant_id))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        check_password_strength(&input.password)?;
        let email = input.email.trim().to_lowercase();
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let role = if self.cfg.admin_emails.contains(&email) { Role::Master } else { Role::Subscriber };
        let user = self.repo.create_user(input.tenant_id, &email, &input.name, role).await?;
        let hash = hash_password(&input.password)?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, tenant_id = ?user.tenant_id, email = %user.email, role = %user.role, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::memory::MemoryAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MemoryAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), password_algorithm: "argon2".into(), token_ttl_hours: 12, reset_token_ttl_minutes: 30, admin_emails: vec![] };
    /// let svc = AuthService::new(repo.clone(), cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { tenant_id: None, email: "u@e.com".into(), name: "Nina".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!(user_id = %user.id, "login rejected");
            return Err(AuthError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let exp = (Utc::now() + Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.email.clone(), uid: user.id, tid: user.tenant_id, role: user.role, exp };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Decode a bearer token; expired or tampered tokens are `Unauthorized`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Unauthorized
            })
    }

    /// Current user behind a verified token, re-read so role changes and deletions apply.
    pub async fn current_user(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        self.repo.find_user(claims.uid).await?.ok_or(AuthError::Unauthorized)
    }

    /// Issue a single-use reset token. Unknown emails yield `None` so callers
    /// can answer identically either way.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("password reset for unknown email");
            return Ok(None);
        };
        let mut raw = [0u8; 32];
        OsRng.fill_bytes(&mut raw);
        let token = hex::encode(raw);
        let expires_at = Utc::now() + Duration::minutes(self.cfg.reset_token_ttl_minutes);
        self.repo.store_reset_token(user.id, &digest(&token), expires_at).await?;
        info!(user_id = %user.id, %expires_at, "password_reset_issued");
        Ok(Some(token))
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        check_password_strength(new_password)?;
        let ticket = self
            .repo
            .consume_reset_token(&digest(token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        if ticket.expires_at < Utc::now() {
            return Err(AuthError::InvalidResetToken);
        }
        let hash = hash_password(new_password)?;
        self.repo.upsert_password(ticket.user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %ticket.user_id, "password_reset_completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::memory::MemoryAuthRepository;

    fn svc(ttl_minutes: i64) -> AuthService<MemoryAuthRepository> {
        AuthService::new(
            Arc::new(MemoryAuthRepository::default()),
            AuthConfig {
                jwt_secret: "test-secret".into(),
                password_algorithm: "argon2".into(),
                token_ttl_hours: 1,
                reset_token_ttl_minutes: ttl_minutes,
                admin_emails: vec!["root@portal.example".into()],
            },
        )
    }

    fn reg(email: &str) -> RegisterInput {
        RegisterInput { tenant_id: None, email: email.into(), name: "Carla Souza".into(), password: "Senha1234".into() }
    }

    #[tokio::test]
    async fn bootstrap_email_becomes_master() {
        let s = svc(30);
        assert_eq!(s.register(reg("ROOT@portal.example")).await.unwrap().role, Role::Master);
        assert_eq!(s.register(reg("ana@example.com")).await.unwrap().role, Role::Subscriber);
    }

    #[tokio::test]
    async fn duplicate_and_weak_registrations_fail() {
        let s = svc(30);
        s.register(reg("ana@example.com")).await.unwrap();
        assert!(matches!(s.register(reg("Ana@Example.com")).await, Err(AuthError::Conflict)));
        assert!(matches!(s.register(reg("  ANA@example.COM ")).await, Err(AuthError::Conflict)));
        let weak = RegisterInput { password: "short".into(), ..reg("bia@example.com") };
        assert_eq!(s.register(weak).await.unwrap_err().code(), 1001);
    }

    #[tokio::test]
    async fn token_round_trip_and_tamper() {
        let s = svc(30);
        let user = s.register(reg("ana@example.com")).await.unwrap();
        let session = s.login(LoginInput { email: "ana@example.com".into(), password: "Senha1234".into() }).await.unwrap();
        let claims = s.verify_token(&session.token).unwrap();
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.role, Role::Subscriber);
        assert_eq!(s.current_user(&claims).await.unwrap(), user);
        assert!(matches!(s.verify_token(&format!("{}x", session.token)), Err(AuthError::Unauthorized)));
        assert!(matches!(
            s.login(LoginInput { email: "ana@example.com".into(), password: "wrong-pass".into() }).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let s = svc(30);
        s.register(reg("ana@example.com")).await.unwrap();
        assert!(s.request_password_reset("nobody@example.com").await.unwrap().is_none());

        let token = s.request_password_reset("ana@example.com").await.unwrap().unwrap();
        s.reset_password(&token, "NovaSenha99").await.unwrap();
        assert!(matches!(s.reset_password(&token, "OutraSenha99").await, Err(AuthError::InvalidResetToken)));
        s.login(LoginInput { email: "ana@example.com".into(), password: "NovaSenha99".into() }).await.unwrap();
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let s = svc(-1);
        s.register(reg("ana@example.com")).await.unwrap();
        let token = s.request_password_reset("ana@example.com").await.unwrap().unwrap();
        assert!(matches!(s.reset_password(&token, "NovaSenha99").await, Err(AuthError::InvalidResetToken)));
    }
}
