use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{comment, CommentStatus, CommentTarget};

use super::repository::CommentRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub target_type: CommentTarget,
    pub target_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub body: String,
}

pub struct CommentService<R: CommentRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CommentRepository + ?Sized> CommentService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// New comments wait in the moderation queue.
    #[instrument(skip(self, input), fields(target = %input.target_type, target_id = %input.target_id))]
    pub async fn submit(&self, input: CommentInput) -> Result<comment::Model, ServiceError> {
        let row = comment::Model {
            id: Uuid::new_v4(),
            target_type: input.target_type.as_str().to_string(),
            target_id: input.target_id,
            author_name: input.author_name.trim().to_string(),
            author_email: input.author_email.trim().to_lowercase(),
            body: input.body.trim().to_string(),
            status: CommentStatus::Pending.as_str().to_string(),
            moderated_at: None,
            created_at: Utc::now().into(),
        };
        comment::validate(&row)?;
        self.repo.insert_comment(&row).await?;
        info!(id = %row.id, "comment queued for moderation");
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, id: Uuid) -> Result<comment::Model, ServiceError> {
        let mut row = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("comment"))?;
        if row.is_approved() {
            return Ok(row);
        }
        row.status = CommentStatus::Approved.as_str().to_string();
        row.moderated_at = Some(Utc::now().into());
        self.repo.save_comment(&row).await?;
        info!(%id, "comment approved");
        Ok(row)
    }

    /// Rejection and removal are the same operation.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete_comment(id).await? {
            return Err(ServiceError::not_found("comment"));
        }
        info!(%id, "comment deleted");
        Ok(())
    }

    pub async fn list_approved(&self, target: CommentTarget, target_id: Uuid) -> Result<Vec<comment::Model>, ServiceError> {
        self.repo.list_for_target(target, target_id, CommentStatus::Approved).await
    }

    pub async fn pending_queue(&self, page: Pagination) -> Result<Vec<comment::Model>, ServiceError> {
        self.repo.list_by_status(CommentStatus::Pending, page).await
    }
}
