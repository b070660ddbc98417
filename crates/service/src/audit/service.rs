use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use models::audit_log;

use super::repository::AuditRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// One admin action before it is stored.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub actor_id: Option<Uuid>,
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: Option<Uuid>,
    pub details: Value,
}

impl AuditEntry {
    pub fn new(actor_id: Option<Uuid>, action: &'static str, entity: &'static str, entity_id: Option<Uuid>) -> Self {
        Self { actor_id, action, entity, entity_id, details: Value::Object(Default::default()) }
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

pub struct AuditService<R: AuditRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: AuditRepository + ?Sized> AuditService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn record(&self, entry: AuditEntry) -> Result<audit_log::Model, ServiceError> {
        let row = audit_log::Model {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action.to_string(),
            entity: entry.entity.to_string(),
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: Utc::now().into(),
        };
        self.repo.append(&row).await?;
        info!(action = %row.action, entity = %row.entity, entity_id = ?row.entity_id, actor_id = ?row.actor_id, "audit");
        Ok(row)
    }

    /// Like [`record`](Self::record) but never fails the caller; the action already happened.
    pub async fn record_quietly(&self, entry: AuditEntry) {
        let (action, entity) = (entry.action, entry.entity);
        if let Err(e) = self.record(entry).await {
            warn!(action, entity, error = %e, "audit write failed");
        }
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<audit_log::Model>, ServiceError> {
        self.repo.recent(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditRepository;
    use serde_json::json;

    #[tokio::test]
    async fn newest_entries_come_first() {
        let svc = AuditService::new(Arc::new(MemoryAuditRepository::new("audit_log")));
        let actor = Some(Uuid::new_v4());
        svc.record(AuditEntry::new(actor, "create", "news", None)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let id = Uuid::new_v4();
        svc.record(AuditEntry::new(actor, "publish", "news", Some(id)).details(json!({"published": true})))
            .await
            .unwrap();

        let rows = svc.list(Pagination::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, "publish");
        assert_eq!(rows[0].details["published"], true);
        assert_eq!(rows[1].details, json!({}));
    }

    struct Unavailable;

    #[async_trait::async_trait]
    impl AuditRepository for Unavailable {
        async fn append(&self, _: &audit_log::Model) -> Result<(), ServiceError> {
            Err(ServiceError::Db("connection refused".into()))
        }
        async fn recent(&self, _: Pagination) -> Result<Vec<audit_log::Model>, ServiceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn quiet_record_swallows_storage_errors() {
        let svc = AuditService::new(Arc::new(Unavailable));
        let entry = AuditEntry::new(None, "delete", "comment", Some(Uuid::new_v4()));
        assert!(svc.record(entry.clone()).await.is_err());
        svc.record_quietly(entry).await;
    }
}
