use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::contract;

use crate::errors::ServiceError;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<contract::Model>, ServiceError>;
    async fn insert_contract(&self, row: &contract::Model) -> Result<(), ServiceError>;
    async fn save_contract(&self, row: &contract::Model) -> Result<(), ServiceError>;
    /// Newest first.
    async fn list_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<contract::Model>, ServiceError>;
}

pub type SeaOrmContractRepository = SeaOrmTable<contract::Model>;

#[async_trait]
impl ContractRepository for SeaOrmContractRepository {
    async fn get(&self, id: Uuid) -> Result<Option<contract::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn insert_contract(&self, row: &contract::Model) -> Result<(), ServiceError> {
        self.insert(row).await
    }

    async fn save_contract(&self, row: &contract::Model) -> Result<(), ServiceError> {
        if !self.update(row).await? {
            return Err(ServiceError::not_found("contract"));
        }
        Ok(())
    }

    async fn list_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<contract::Model>, ServiceError> {
        Ok(contract::Entity::find()
            .filter(contract::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(contract::Column::CreatedAt)
            .all(self.db())
            .await?)
    }
}

pub type MemoryContractRepository = MemoryTable<contract::Model>;

#[async_trait]
impl ContractRepository for MemoryContractRepository {
    async fn get(&self, id: Uuid) -> Result<Option<contract::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn insert_contract(&self, row: &contract::Model) -> Result<(), ServiceError> {
        self.insert(row.clone()).await
    }

    async fn save_contract(&self, row: &contract::Model) -> Result<(), ServiceError> {
        if !self.replace(row.clone()).await? {
            return Err(ServiceError::not_found("contract"));
        }
        Ok(())
    }

    async fn list_for_subscriber(&self, subscriber_id: Uuid) -> Result<Vec<contract::Model>, ServiceError> {
        let mut rows = self.filter(|c| c.subscriber_id == subscriber_id).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
