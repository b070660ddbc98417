use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use models::{password_reset_token, user, user_credentials, Role};

use crate::auth::domain::{AuthUser, Credentials, ResetToken};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::schema::is_duplicate_key;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_domain(u: user::Model) -> AuthUser {
    let role = u.role();
    AuthUser { id: u.id, tenant_id: u.tenant_id, email: u.email, name: u.name, role }
}

fn repo_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Repository(e.to_string())
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_domain))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_domain))
    }

    async fn create_user(&self, tenant_id: Option<Uuid>, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
        match user::create(&self.db, tenant_id, email, name, role).await {
            Ok(created) => Ok(to_domain(created)),
            Err(models::errors::ModelError::Db(msg)) if is_duplicate_key(&msg) => Err(AuthError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_for_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }

    async fn store_reset_token(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        password_reset_token::issue(&self.db, user_id, token_hash, expires_at.into()).await?;
        Ok(())
    }

    async fn consume_reset_token(&self, token_hash: &str) -> Result<Option<ResetToken>, AuthError> {
        let res = password_reset_token::consume(&self.db, token_hash).await?;
        Ok(res.map(|t| ResetToken { user_id: t.user_id, expires_at: t.expires_at.with_timezone(&Utc) }))
    }
}
