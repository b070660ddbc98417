use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use models::Role;

use super::domain::{AuthUser, Credentials, ResetToken};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Emails are stored lowercased; soft-deleted users are not returned.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, tenant_id: Option<Uuid>, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    async fn store_reset_token(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError>;
    /// Mark an unused token used; `None` if unknown or already redeemed.
    async fn consume_reset_token(&self, token_hash: &str) -> Result<Option<ResetToken>, AuthError>;
}

/// In-process repository for tests, doc examples and demo mode
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct StoredToken {
        user_id: Uuid,
        expires_at: DateTime<Utc>,
        used: bool,
    }

    #[derive(Default)]
    pub struct MemoryAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: lowercased email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
        resets: Mutex<HashMap<String, StoredToken>>, // key: token hash
    }

    #[async_trait]
    impl AuthRepository for MemoryAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().await.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().await.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, tenant_id: Option<Uuid>, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
            models::validation::validate_email(email)?;
            models::validation::validate_name(name)?;
            let key = email.trim().to_lowercase();
            let mut users = self.users.lock().await;
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), tenant_id, email: key.clone(), name: name.trim().to_string(), role };
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            Ok(self.creds.lock().await.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let c = Credentials { user_id, password_hash, password_algorithm };
            self.creds.lock().await.insert(user_id, c.clone());
            Ok(c)
        }

        async fn store_reset_token(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
            self.resets
                .lock()
                .await
                .insert(token_hash.to_string(), StoredToken { user_id, expires_at, used: false });
            Ok(())
        }

        async fn consume_reset_token(&self, token_hash: &str) -> Result<Option<ResetToken>, AuthError> {
            let mut resets = self.resets.lock().await;
            match resets.get_mut(token_hash) {
                Some(t) if !t.used => {
                    t.used = true;
                    Ok(Some(ResetToken { user_id: t.user_id, expires_at: t.expires_at }))
                }
                _ => Ok(None),
            }
        }
    }
}
