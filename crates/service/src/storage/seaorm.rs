//! PostgreSQL tables through SeaORM.
//!
//! Writes never use `RETURNING`: a table missing an optional column would
//! fail on the returned column list even when the write itself omits it.
//! Row reads list their columns explicitly and select the default in place
//! of an optional column the table lacks.

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityName, EntityTrait, FromQueryResult, IdenStatic,
    Iterable, QueryFilter, QuerySelect, QueryTrait, Select, Value,
};
use tracing::warn;
use uuid::Uuid;

use models::{audit_log, category, comment, contract, event, news, order, order_item, product, subscriber, SchemaTolerant};

use super::Row;
use crate::errors::ServiceError;
use crate::schema::{missing_among, TolerantTable};
use crate::slug::SlugLookup;

/// A row type backed by a SeaORM entity.
pub trait SeaRow: Row + FromQueryResult {
    type Entity: EntityTrait<Model = Self>;
    type Active: ActiveModelTrait<Entity = Self::Entity> + Send;

    /// Columns a deployed table may not have yet.
    const OPTIONAL_COLUMNS: &'static [&'static str] = &[];

    /// Every column set.
    fn to_active(&self) -> Self::Active;

    /// Value read in place of a missing optional column.
    fn column_default(_column: &str) -> Option<Value> { None }
}

macro_rules! sea_row {
    ($($m:ident),+) => {$(
        impl SeaRow for $m::Model {
            type Entity = $m::Entity;
            type Active = $m::ActiveModel;
            fn to_active(&self) -> Self::Active { $m::active_model(self) }
        }
    )+};
}

macro_rules! tolerant_sea_row {
    ($($m:ident),+) => {$(
        impl SeaRow for $m::Model {
            type Entity = $m::Entity;
            type Active = $m::ActiveModel;
            const OPTIONAL_COLUMNS: &'static [&'static str] = <$m::Model as SchemaTolerant>::OPTIONAL_COLUMNS;
            fn to_active(&self) -> Self::Active { $m::active_model(self) }
            fn column_default(column: &str) -> Option<Value> {
                <$m::Model as SchemaTolerant>::column_default(column)
            }
        }
    )+};
}

sea_row!(product, comment, order, order_item, contract, audit_log);
tolerant_sea_row!(category, subscriber, news, event);

/// Column of `E` by its database name.
pub fn column<E: EntityTrait>(name: &str) -> Result<E::Column, ServiceError> {
    E::Column::iter()
        .find(|c| c.as_str() == name)
        .ok_or_else(|| ServiceError::Db(format!("column {name} is not mapped on {}", E::default().table_name())))
}

/// Every column of `M` by name, with `missing` ones replaced by their defaults.
fn select_columns<M: SeaRow>(missing: &[&'static str]) -> Select<M::Entity> {
    let mut q = M::Entity::find().select_only();
    for col in <M::Entity as EntityTrait>::Column::iter() {
        let name = col.as_str();
        let default = if missing.iter().any(|m| *m == name) { M::column_default(name) } else { None };
        q = match default {
            Some(value) => q.column_as(SimpleExpr::Value(value), name),
            None => q.column(col),
        };
    }
    q
}

/// Typed access to one table.
pub struct SeaOrmTable<M> {
    db: DatabaseConnection,
    _row: PhantomData<fn() -> M>,
}

impl<M: SeaRow> SeaOrmTable<M> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, _row: PhantomData }
    }

    pub fn db(&self) -> &DatabaseConnection { &self.db }

    pub async fn by_id(&self, id: Uuid) -> Result<Option<M>, ServiceError> {
        self.find_by("id", id).await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<M>, ServiceError> {
        self.find_by("slug", slug).await
    }

    /// First row whose `col` equals `value`.
    pub async fn find_by<V>(&self, col: &str, value: V) -> Result<Option<M>, ServiceError>
    where
        V: Into<Value> + Send,
    {
        self.read_one(column::<M::Entity>(col)?.eq(value)).await
    }

    /// Read one row, retrying with defaults for each optional column the
    /// driver reports missing.
    async fn read_one(&self, filter: SimpleExpr) -> Result<Option<M>, ServiceError> {
        let mut missing: Vec<&'static str> = Vec::new();
        loop {
            let err: ServiceError = match select_columns::<M>(&missing)
                .filter(filter.clone())
                .into_model::<M>()
                .one(&self.db)
                .await
            {
                Ok(row) => return Ok(row),
                Err(e) => e.into(),
            };
            match missing_among(M::OPTIONAL_COLUMNS, &err) {
                Some(col) if !missing.contains(&col) => {
                    let entity = M::Entity::default();
                    let table = entity.table_name();
                    warn!(table, column = col, "optional column missing; reading its default");
                    common::metrics::record_schema_fallback(table, col);
                    missing.push(col);
                }
                _ => return Err(err),
            }
        }
    }

    /// Plain `INSERT` of the active model.
    async fn exec_insert(&self, am: M::Active) -> Result<(), ServiceError> {
        let stmt = M::Entity::insert(am).build(self.db.get_database_backend());
        self.db.execute(stmt).await?;
        Ok(())
    }

    pub async fn insert(&self, row: &M) -> Result<(), ServiceError> {
        self.exec_insert(row.to_active()).await
    }

    /// Overwrite every column of the row with the same id.
    pub async fn update(&self, row: &M) -> Result<bool, ServiceError> {
        let id_col = column::<M::Entity>("id")?;
        let mut am = row.to_active();
        am.not_set(id_col);
        let res = M::Entity::update_many()
            .set(am)
            .filter(id_col.eq(row.row_id()))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// `UPDATE t SET col = col + 1 WHERE id = ?` in a single statement.
    pub async fn increment(&self, id: Uuid, col: &str) -> Result<bool, ServiceError> {
        let col = column::<M::Entity>(col)?;
        let res = M::Entity::update_many()
            .col_expr(col, Expr::col(col).add(1))
            .filter(column::<M::Entity>("id")?.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn set_value<V>(&self, id: Uuid, col: &str, value: V) -> Result<bool, ServiceError>
    where
        V: Into<sea_orm::Value> + Send,
    {
        let res = M::Entity::update_many()
            .col_expr(column::<M::Entity>(col)?, Expr::value(value.into()))
            .filter(column::<M::Entity>("id")?.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = M::Entity::delete_many()
            .filter(column::<M::Entity>("id")?.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl<M: SeaRow> SlugLookup for SeaOrmTable<M> {
    /// Selects the id only, so a missing optional column cannot fail it.
    async fn slug_exists(&self, slug: &str) -> Result<bool, ServiceError> {
        let hit = M::Entity::find()
            .select_only()
            .column(column::<M::Entity>("id")?)
            .filter(column::<M::Entity>("slug")?.eq(slug))
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await?;
        Ok(hit.is_some())
    }
}

#[async_trait]
impl<M: SeaRow + SchemaTolerant> TolerantTable<M> for SeaOrmTable<M> {
    async fn insert_row(&self, row: &M, omit: &[&'static str]) -> Result<(), ServiceError> {
        let mut am = row.to_active();
        for name in omit {
            am.not_set(column::<M::Entity>(name)?);
        }
        self.exec_insert(am).await
    }

    async fn update_row(&self, row: &M, omit: &[&'static str]) -> Result<(), ServiceError> {
        let id_col = column::<M::Entity>("id")?;
        let mut am = row.to_active();
        am.not_set(id_col);
        for name in omit {
            am.not_set(column::<M::Entity>(name)?);
        }
        M::Entity::update_many()
            .set(am)
            .filter(id_col.eq(row.row_id()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn update_column(&self, row: &M, name: &'static str) -> Result<(), ServiceError> {
        let col = column::<M::Entity>(name)?;
        let value = row
            .to_active()
            .get(col)
            .into_value()
            .ok_or_else(|| ServiceError::Db(format!("no value for column {name}")))?;
        M::Entity::update_many()
            .col_expr(col, Expr::value(value))
            .filter(column::<M::Entity>("id")?.eq(row.row_id()))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
