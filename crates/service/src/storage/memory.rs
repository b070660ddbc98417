//! In-process tables.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::SchemaTolerant;

use super::Row;
use crate::errors::ServiceError;
use crate::schema::TolerantTable;
use crate::slug::SlugLookup;

/// A table held in memory. Columns can be dropped to mimic a database that
/// lags behind the entity definitions. Writes naming a dropped column and
/// full-row scans (`filter`, `count`) fail with the messages PostgreSQL
/// produces. `by_id` and `find_one` behave like the tolerant single-row
/// reads and return dropped columns at their defaults.
pub struct MemoryTable<T> {
    name: &'static str,
    rows: RwLock<Vec<T>>,
    missing: RwLock<HashSet<String>>,
}

impl<T: Row> MemoryTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, rows: RwLock::new(Vec::new()), missing: RwLock::new(HashSet::new()) }
    }

    pub fn name(&self) -> &'static str { self.name }

    /// Remove a column from the simulated schema.
    pub async fn drop_column(&self, column: &str) {
        self.missing.write().await.insert(column.to_string());
    }

    /// Fail like a `SELECT` listing every column while any is dropped.
    async fn require_full_row(&self) -> Result<(), ServiceError> {
        let missing = self.missing.read().await;
        match missing.iter().min() {
            Some(col) => Err(ServiceError::Db(format!("column {}.{} does not exist", self.name, col))),
            None => Ok(()),
        }
    }

    async fn require_writable<'a, I>(&self, columns: I) -> Result<(), ServiceError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing = self.missing.read().await;
        for col in columns {
            if missing.contains(col) {
                return Err(ServiceError::Db(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    col, self.name
                )));
            }
        }
        Ok(())
    }

    fn duplicate(&self, what: &str) -> ServiceError {
        ServiceError::Db(format!(
            "duplicate key value violates unique constraint \"{}_{}_key\"",
            self.name, what
        ))
    }

    fn check_unique(&self, rows: &[T], row: &T) -> Result<(), ServiceError> {
        for other in rows.iter().filter(|r| r.row_id() != row.row_id()) {
            if let (Some(a), Some(b)) = (other.slug(), row.slug()) {
                if a == b {
                    return Err(self.duplicate("slug"));
                }
            }
        }
        Ok(())
    }

    pub async fn insert(&self, row: T) -> Result<(), ServiceError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.row_id() == row.row_id()) {
            return Err(self.duplicate("pkey"));
        }
        self.check_unique(&rows, &row)?;
        rows.push(row);
        Ok(())
    }

    /// Overwrite the row with the same id; false if absent.
    pub async fn replace(&self, row: T) -> Result<bool, ServiceError> {
        let mut rows = self.rows.write().await;
        self.check_unique(&rows, &row)?;
        match rows.iter_mut().find(|r| r.row_id() == row.row_id()) {
            Some(existing) => {
                *existing = row;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn by_id(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.iter().find(|r| r.row_id() == id).cloned()
    }

    pub async fn find_one<F: Fn(&T) -> bool>(&self, pred: F) -> Option<T> {
        self.rows.read().await.iter().find(|r| pred(r)).cloned()
    }

    pub async fn filter<F: Fn(&T) -> bool>(&self, pred: F) -> Result<Vec<T>, ServiceError> {
        self.require_full_row().await?;
        Ok(self.rows.read().await.iter().filter(|r| pred(r)).cloned().collect())
    }

    pub async fn count<F: Fn(&T) -> bool>(&self, pred: F) -> Result<u64, ServiceError> {
        self.require_full_row().await?;
        Ok(self.rows.read().await.iter().filter(|r| pred(r)).count() as u64)
    }

    pub async fn slug_taken(&self, slug: &str) -> bool {
        self.rows.read().await.iter().any(|r| r.slug() == Some(slug))
    }

    /// Mutate one row in place under the write lock; `None` if absent.
    pub async fn modify<F: FnOnce(&mut T)>(&self, id: Uuid, f: F) -> Option<T> {
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|r| r.row_id() == id)?;
        f(row);
        Some(row.clone())
    }

    /// Like `modify`, but only when `guard` holds for the current row.
    /// `Some(false)` when the row exists and the guard rejected it.
    pub async fn modify_if<G, F>(&self, id: Uuid, guard: G, f: F) -> Option<bool>
    where
        G: FnOnce(&T) -> bool,
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        let row = rows.iter_mut().find(|r| r.row_id() == id)?;
        if !guard(row) {
            return Some(false);
        }
        f(row);
        Some(true)
    }

    /// Run `f` over the whole table while holding the write lock.
    pub async fn with_rows<R, F: FnOnce(&mut Vec<T>) -> R>(&self, f: F) -> R {
        let mut rows = self.rows.write().await;
        f(&mut rows)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.row_id() != id);
        rows.len() != before
    }
}

#[async_trait]
impl<T: Row> SlugLookup for MemoryTable<T> {
    async fn slug_exists(&self, slug: &str) -> Result<bool, ServiceError> {
        Ok(self.slug_taken(slug).await)
    }
}

#[async_trait]
impl<T: Row + SchemaTolerant> TolerantTable<T> for MemoryTable<T> {
    async fn insert_row(&self, row: &T, omit: &[&'static str]) -> Result<(), ServiceError> {
        self.require_writable(T::OPTIONAL_COLUMNS.iter().copied().filter(|c| !omit.contains(c))).await?;
        let mut stored = row.clone();
        for col in omit {
            stored.clear_column(col);
        }
        self.insert(stored).await
    }

    async fn update_row(&self, row: &T, omit: &[&'static str]) -> Result<(), ServiceError> {
        self.require_writable(T::OPTIONAL_COLUMNS.iter().copied().filter(|c| !omit.contains(c))).await?;
        let mut rows = self.rows.write().await;
        self.check_unique(&rows, row)?;
        if let Some(existing) = rows.iter_mut().find(|r| r.row_id() == row.row_id()) {
            let mut next = row.clone();
            for col in omit {
                next.copy_column(existing, col);
            }
            *existing = next;
        }
        Ok(())
    }

    async fn update_column(&self, row: &T, column: &'static str) -> Result<(), ServiceError> {
        self.require_writable([column]).await?;
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.iter_mut().find(|r| r.row_id() == row.row_id()) {
            existing.copy_column(row, column);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{insert_tolerant, update_tolerant};
    use chrono::Utc;
    use models::category;

    fn cat(name: &str, slug: &str) -> category::Model {
        let now = Utc::now().into();
        category::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            kind: Some("news".into()),
            parent_id: None,
            order_index: 4,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_slug_uses_driver_message() {
        let table = MemoryTable::new("categories");
        table.insert(cat("A", "a")).await.unwrap();
        let err = table.insert(cat("B", "a")).await.unwrap_err();
        assert!(crate::schema::is_duplicate_key(err.db_message().unwrap()));
    }

    #[tokio::test]
    async fn tolerant_insert_skips_missing_columns() {
        let table = MemoryTable::new("categories");
        table.drop_column("order_index").await;

        let stored = insert_tolerant(&table, cat("Cultura", "cultura")).await.unwrap();
        assert_eq!(stored.order_index, 0);
        assert_eq!(stored.kind.as_deref(), Some("news"));

        let row = table.by_id(stored.id).await.unwrap();
        assert_eq!(row.order_index, 0);
        assert_eq!(row.kind.as_deref(), Some("news"));
    }

    #[tokio::test]
    async fn tolerant_update_keeps_previous_value_for_missing_column() {
        let table = MemoryTable::new("categories");
        let original = insert_tolerant(&table, cat("Esporte", "esporte")).await.unwrap();
        table.drop_column("is_active").await;

        let mut next = original.clone();
        next.name = "Esportes".into();
        next.is_active = false;
        let stored = update_tolerant(&table, &original, next).await.unwrap();
        assert_eq!(stored.name, "Esportes");
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn full_row_scans_fail_but_slug_lookup_does_not() {
        let table = MemoryTable::new("categories");
        table.insert(cat("Obras", "obras")).await.unwrap();
        table.drop_column("type").await;

        let err = table.filter(|_| true).await.unwrap_err();
        assert_eq!(crate::schema::missing_column(err.db_message().unwrap()).as_deref(), Some("type"));
        assert!(table.count(|_| true).await.is_err());

        assert!(table.slug_exists("obras").await.unwrap());
        assert!(!table.slug_exists("praias").await.unwrap());
        let row = table.find_one(|c| c.slug == "obras").await.unwrap();
        assert_eq!(row.name, "Obras");
    }
}
