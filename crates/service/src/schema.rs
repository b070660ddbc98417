//! Writes that survive a database lagging behind the entity definitions.
//!
//! A write first goes out with every column. If the driver reports a missing
//! optional column, the row is written again with the core columns only and
//! each optional column is then applied on its own, skipping the ones the
//! table does not have.

use async_trait::async_trait;
use tracing::{debug, warn};

use models::SchemaTolerant;

use crate::errors::ServiceError;

/// Name of the missing column in a driver or REST-gateway error message.
///
/// Recognises `column "x" of relation "t" does not exist`,
/// `column t.x does not exist` and `Could not find the 'x' column of 't'`.
pub fn missing_column(msg: &str) -> Option<String> {
    if let Some(rest) = after(msg, "Could not find the '") {
        let name = rest.split('\'').next()?;
        return non_empty(name);
    }
    let rest = after(msg, "column ")?;
    if !rest.contains("does not exist") {
        return None;
    }
    let name = if let Some(quoted) = rest.strip_prefix('"') {
        quoted.split('"').next()?
    } else {
        let ident = rest.split_whitespace().next()?;
        ident.rsplit('.').next()?
    };
    non_empty(name.trim_matches('"'))
}

/// True for unique-constraint violations (message or SQLSTATE 23505).
pub fn is_duplicate_key(msg: &str) -> bool {
    msg.contains("duplicate key value violates unique constraint") || msg.contains("23505")
}

/// True only when the violated constraint is a `<table>_slug_key`.
pub fn is_duplicate_slug(msg: &str) -> bool {
    after(msg, "duplicate key value violates unique constraint \"")
        .and_then(|rest| rest.split('"').next())
        .is_some_and(|name| name.ends_with("_slug_key"))
}

fn after<'a>(msg: &'a str, marker: &str) -> Option<&'a str> {
    msg.find(marker).map(|i| &msg[i + marker.len()..])
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Missing optional column named in `err`, if that is what failed.
pub fn missing_optional<M: SchemaTolerant>(err: &ServiceError) -> Option<&'static str> {
    missing_among(M::OPTIONAL_COLUMNS, err)
}

/// Which of `columns` the failed statement named as missing.
pub fn missing_among(columns: &[&'static str], err: &ServiceError) -> Option<&'static str> {
    let col = missing_column(err.db_message()?)?;
    columns.iter().copied().find(|c| *c == col)
}

/// Row-level writes a backend must offer for tolerant inserts and updates.
#[async_trait]
pub trait TolerantTable<M: SchemaTolerant + Send + Sync>: Send + Sync {
    /// Insert `row`, leaving `omit` columns to their table defaults.
    async fn insert_row(&self, row: &M, omit: &[&'static str]) -> Result<(), ServiceError>;
    /// Overwrite the stored row with the same id, except the `omit` columns.
    async fn update_row(&self, row: &M, omit: &[&'static str]) -> Result<(), ServiceError>;
    /// Write a single column of the stored row with the same id.
    async fn update_column(&self, row: &M, column: &'static str) -> Result<(), ServiceError>;
}

/// Insert `row`, degrading to core columns when optional ones are missing.
/// The returned model reflects what was stored.
pub async fn insert_tolerant<M, T>(table: &T, row: M) -> Result<M, ServiceError>
where
    M: SchemaTolerant + Send + Sync,
    T: TolerantTable<M> + ?Sized,
{
    let err = match table.insert_row(&row, &[]).await {
        Ok(()) => return Ok(row),
        Err(e) => e,
    };
    let Some(column) = missing_optional::<M>(&err) else { return Err(err) };
    warn!(table = M::TABLE, column, "optional column missing; inserting core columns");
    common::metrics::record_schema_fallback(M::TABLE, column);

    table.insert_row(&row, M::OPTIONAL_COLUMNS).await?;
    let mut stored = row.clone();
    for col in M::OPTIONAL_COLUMNS {
        if let Err(e) = table.update_column(&row, col).await {
            debug!(table = M::TABLE, column = *col, error = %e, "optional column skipped");
            stored.clear_column(col);
        }
    }
    Ok(stored)
}

/// Update counterpart of [`insert_tolerant`]. Columns that could not be
/// written keep their `previous` value in the returned model.
pub async fn update_tolerant<M, T>(table: &T, previous: &M, row: M) -> Result<M, ServiceError>
where
    M: SchemaTolerant + Send + Sync,
    T: TolerantTable<M> + ?Sized,
{
    let err = match table.update_row(&row, &[]).await {
        Ok(()) => return Ok(row),
        Err(e) => e,
    };
    let Some(column) = missing_optional::<M>(&err) else { return Err(err) };
    warn!(table = M::TABLE, column, "optional column missing; updating core columns");
    common::metrics::record_schema_fallback(M::TABLE, column);

    table.update_row(&row, M::OPTIONAL_COLUMNS).await?;
    let mut stored = row.clone();
    for col in M::OPTIONAL_COLUMNS {
        if let Err(e) = table.update_column(&row, col).await {
            debug!(table = M::TABLE, column = *col, error = %e, "optional column skipped");
            stored.copy_column(previous, col);
        }
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postgres_insert_message() {
        let msg = r#"Execution Error: error returned from database: column "gallery" of relation "news" does not exist"#;
        assert_eq!(missing_column(msg).as_deref(), Some("gallery"));
    }

    #[test]
    fn parses_postgres_select_message() {
        assert_eq!(missing_column("column categories.type does not exist").as_deref(), Some("type"));
        assert_eq!(missing_column(r#"column "is_active" does not exist"#).as_deref(), Some("is_active"));
    }

    #[test]
    fn parses_rest_gateway_message() {
        let msg = "Could not find the 'order_index' column of 'categories' in the schema cache";
        assert_eq!(missing_column(msg).as_deref(), Some("order_index"));
    }

    #[test]
    fn ignores_unrelated_messages() {
        assert_eq!(missing_column("connection refused"), None);
        assert_eq!(missing_column("column type mismatch"), None);
    }

    #[test]
    fn detects_duplicate_key() {
        assert!(is_duplicate_key(r#"duplicate key value violates unique constraint "news_slug_key""#));
        assert!(is_duplicate_key("error code 23505"));
        assert!(!is_duplicate_key("column \"x\" does not exist"));
    }

    #[test]
    fn only_slug_constraints_count_as_slug_collisions() {
        assert!(is_duplicate_slug(r#"duplicate key value violates unique constraint "news_slug_key""#));
        assert!(!is_duplicate_slug(r#"duplicate key value violates unique constraint "subscribers_user_id_key""#));
        assert!(!is_duplicate_slug(r#"duplicate key value violates unique constraint "news_pkey""#));
        assert!(!is_duplicate_slug("error code 23505"));
    }
}
