use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, JsonValue, QueryFilter, QueryOrder, Statement,
};
use uuid::Uuid;

use models::{category, CategoryType};

use crate::errors::ServiceError;
use crate::schema::TolerantTable;
use crate::slug::SlugLookup;
use crate::storage::memory::MemoryTable;
use crate::storage::seaorm::SeaOrmTable;

#[async_trait]
pub trait CategoryRepository: TolerantTable<category::Model> + SlugLookup {
    async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError>;
    /// Active rows of `kind` (all kinds when `None`), ordered by `order_index, name`.
    async fn list_active(&self, kind: Option<CategoryType>) -> Result<Vec<category::Model>, ServiceError>;
    /// Every row, reading whatever columns the table has.
    async fn list_all_raw(&self) -> Result<Vec<category::Model>, ServiceError>;
}

pub type SeaOrmCategoryRepository = SeaOrmTable<category::Model>;

#[async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
        self.by_id(id).await
    }

    async fn list_active(&self, kind: Option<CategoryType>) -> Result<Vec<category::Model>, ServiceError> {
        let mut q = category::Entity::find().filter(category::Column::IsActive.eq(true));
        if let Some(kind) = kind {
            q = q.filter(category::Column::Kind.eq(kind.as_str()));
        }
        Ok(q
            .order_by_asc(category::Column::OrderIndex)
            .order_by_asc(category::Column::Name)
            .all(self.db())
            .await?)
    }

    async fn list_all_raw(&self) -> Result<Vec<category::Model>, ServiceError> {
        let rows = JsonValue::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            "SELECT * FROM categories".to_string(),
        ))
        .all(self.db())
        .await?;
        rows.into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| ServiceError::Db(format!("category row: {e}"))))
            .collect()
    }
}

pub type MemoryCategoryRepository = MemoryTable<category::Model>;

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
        Ok(self.by_id(id).await)
    }

    async fn list_active(&self, kind: Option<CategoryType>) -> Result<Vec<category::Model>, ServiceError> {
        let mut rows = self
            .filter(|c| c.is_active && kind.map_or(true, |k| c.kind.as_deref() == Some(k.as_str())))
            .await?;
        rows.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn list_all_raw(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(self.with_rows(|rows| rows.clone()).await)
    }
}
